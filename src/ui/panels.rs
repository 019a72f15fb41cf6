use eframe::egui::{self, Color32, RichText, Ui};

use cte_despike::data::export::ExportFormat;

use crate::app::{DespikeApp, Page};
use crate::ui::{plot, table};

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, app: &mut DespikeApp) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open…").clicked() {
                open_file_dialog(app);
                ui.close_menu();
            }
            let can_export = app.session.is_uploaded();
            if ui
                .add_enabled(can_export, egui::Button::new("Save processed file…"))
                .clicked()
            {
                save_file_dialog(app);
                ui.close_menu();
            }
        });

        ui.menu_button("Go", |ui: &mut Ui| {
            if ui.button("Home").clicked() {
                app.page = Page::Home;
                ui.close_menu();
            }
            if ui.button("Despiking Module").clicked() {
                app.page = Page::Despiking;
                ui.close_menu();
            }
        });

        ui.separator();

        if let Some(upload) = app.session.upload() {
            ui.label(format!(
                "{}: {} columns, {} rows",
                upload.file_name,
                upload.table.column_count(),
                upload.table.row_count()
            ));
        }
        if let Some(processed) = app.session.processed() {
            ui.separator();
            ui.label(format!(
                "{}/{} pairs smoothed, {} spike(s) removed",
                processed.report.smoothed_pairs(),
                processed.report.pairs.len(),
                processed.report.spikes_removed()
            ));
        }
    });
}

// ---------------------------------------------------------------------------
// Pages
// ---------------------------------------------------------------------------

pub fn home_page(ui: &mut Ui, app: &mut DespikeApp) {
    ui.vertical_centered(|ui: &mut Ui| {
        ui.add_space(60.0);
        ui.heading("Online Simulation Calculator");
        ui.add_space(16.0);
        ui.label(
            "Welcome to the Online Simulation Calculator. Navigate to the Despiking \
             Module to upload and process your data.",
        );
        ui.add_space(30.0);
        if ui.button("Go to Despiking Module").clicked() {
            app.page = Page::Despiking;
        }
    });
}

/// Upload → preview → smooth → plots → download, top to bottom.
pub fn despiking_page(ui: &mut Ui, app: &mut DespikeApp) {
    ui.vertical_centered(|ui: &mut Ui| {
        ui.heading("Despiking Module");
        ui.add_space(8.0);
        if ui.button("Upload Input File").clicked() {
            open_file_dialog(app);
        }
        match app.session.upload() {
            Some(upload) => ui.label(format!("Uploaded File: {}", upload.file_name)),
            None => ui.label("No file uploaded yet."),
        };
        if let Some(msg) = app.session.status_message() {
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });

    if let Some(upload) = app.session.upload() {
        ui.separator();
        table::data_table(ui, &upload.table, &mut app.table_page);
        ui.separator();
    } else {
        return;
    }

    ui.vertical_centered(|ui: &mut Ui| {
        ui.add_space(12.0);
        if ui.button("Splinefit and Visualize").clicked() {
            // Failures are reported through the session status line.
            let _ = app.session.smooth();
        }
    });

    if !app.session.is_processed() {
        return;
    }

    ui.separator();
    let figures = app.session.figures();
    plot::comparison_plots(ui, &figures, &app.palette);

    ui.vertical_centered(|ui: &mut Ui| {
        if ui.button("Download Processed File").clicked() {
            save_file_dialog(app);
        }
        ui.add_space(30.0);
    });
}

// ---------------------------------------------------------------------------
// File dialogs
// ---------------------------------------------------------------------------

pub fn open_file_dialog(app: &mut DespikeApp) {
    let file = rfd::FileDialog::new()
        .set_title("Open raw CTE data")
        .add_filter("Supported files", &["xlsx", "xlsm", "csv"])
        .add_filter("Excel workbook", &["xlsx", "xlsm"])
        .add_filter("CSV", &["csv"])
        .pick_file();

    if let Some(path) = file {
        if app.session.open_path(&path) {
            app.on_upload();
            app.page = Page::Despiking;
        }
    }
}

pub fn save_file_dialog(app: &mut DespikeApp) {
    let export = &app.session.config().export;
    let default_name = export.file_name(export.format);

    let Some(path) = rfd::FileDialog::new()
        .set_title("Download processed file")
        .set_file_name(default_name)
        .add_filter("Excel workbook", &["xlsx"])
        .add_filter("CSV", &["csv"])
        .save_file()
    else {
        return;
    };

    let format = match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("csv") => ExportFormat::Csv,
        _ => ExportFormat::Xlsx,
    };

    let Ok(file) = app.session.export_as(format) else {
        return;
    };
    match std::fs::write(&path, &file.bytes) {
        Ok(()) => log::info!("Saved {} bytes to {}", file.bytes.len(), path.display()),
        Err(e) => {
            log::error!("Failed to write {}: {e}", path.display());
            app.session
                .set_status_message(format!("Error writing {}: {e}", path.display()));
        }
    }
}
