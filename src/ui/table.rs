use eframe::egui::{self, Ui};
use egui_extras::{Column as TableColumn, TableBuilder};

use cte_despike::data::model::is_missing;
use cte_despike::WideTable;

/// Rows shown per page of the preview.
pub const PAGE_SIZE: usize = 10;

/// Paged preview of a table; `page` is clamped to the available pages.
pub fn data_table(ui: &mut Ui, table: &WideTable, page: &mut usize) {
    let rows = table.row_count();
    let pages = rows.div_ceil(PAGE_SIZE).max(1);
    *page = (*page).min(pages - 1);

    ui.horizontal(|ui: &mut Ui| {
        if ui.add_enabled(*page > 0, egui::Button::new("◀")).clicked() {
            *page -= 1;
        }
        ui.label(format!("Page {} of {pages}", *page + 1));
        if ui
            .add_enabled(*page + 1 < pages, egui::Button::new("▶"))
            .clicked()
        {
            *page += 1;
        }
        ui.separator();
        ui.label(format!("{rows} rows"));
    });

    let start = *page * PAGE_SIZE;
    let shown = PAGE_SIZE.min(rows.saturating_sub(start));

    egui::ScrollArea::horizontal()
        .id_salt("data_table_scroll")
        .show(ui, |ui: &mut Ui| {
            TableBuilder::new(ui)
                .striped(true)
                .vscroll(false)
                .columns(TableColumn::auto().at_least(90.0), table.column_count())
                .header(22.0, |mut header| {
                    for column in table.columns() {
                        header.col(|ui: &mut Ui| {
                            ui.strong(&column.name);
                        });
                    }
                })
                .body(|body| {
                    body.rows(18.0, shown, |mut row| {
                        let r = start + row.index();
                        for column in table.columns() {
                            let value = column.values[r];
                            row.col(|ui: &mut Ui| {
                                if !is_missing(value) {
                                    ui.label(value.to_string());
                                }
                            });
                        }
                    });
                });
        });
}
