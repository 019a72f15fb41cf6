mod app;
mod color;
mod ui;

use app::DespikeApp;
use cte_despike::DespikeConfig;
use eframe::egui;

fn main() -> eframe::Result {
    env_logger::init();

    let config = DespikeConfig::from_env();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1200.0, 900.0])
            .with_min_inner_size([700.0, 500.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Online Simulation Calculator – Data Despiking and Smoothing",
        options,
        Box::new(|_cc| Ok(Box::new(DespikeApp::new(config)))),
    )
}
