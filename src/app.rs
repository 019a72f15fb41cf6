use eframe::egui;

use cte_despike::{DespikeConfig, Session};

use crate::color::RatePalette;
use crate::ui::panels;

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Home,
    Despiking,
}

/// View state only; all data lives in the [`Session`].
pub struct DespikeApp {
    pub session: Session,
    pub page: Page,
    /// Current page of the data preview table.
    pub table_page: usize,
    pub palette: RatePalette,
}

impl DespikeApp {
    pub fn new(config: DespikeConfig) -> Self {
        Self {
            session: Session::new(config),
            page: Page::Home,
            table_page: 0,
            palette: RatePalette::default(),
        }
    }

    /// Reset view state for a freshly uploaded table.
    pub fn on_upload(&mut self) {
        self.table_page = 0;
        self.palette = self
            .session
            .upload()
            .map(|u| RatePalette::for_table(&u.table))
            .unwrap_or_default();
    }
}

impl eframe::App for DespikeApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // ---- Top panel: menu bar ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, self);
        });

        // ---- Central panel: current page ----
        let page = self.page;
        egui::CentralPanel::default().show(ctx, |ui| match page {
            Page::Home => panels::home_page(ui, self),
            Page::Despiking => {
                egui::ScrollArea::vertical()
                    .auto_shrink([false, false])
                    .show(ui, |ui| panels::despiking_page(ui, self));
            }
        });
    }
}
