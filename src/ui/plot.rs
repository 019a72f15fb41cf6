use eframe::egui::Ui;
use egui_plot::{Legend, Line, Plot, PlotPoints, Points};

use cte_despike::data::figure::{ComparisonFigure, X_AXIS_LABEL, Y_AXIS_LABEL};

use crate::color::RatePalette;

// ---------------------------------------------------------------------------
// Raw vs smoothed comparison plots
// ---------------------------------------------------------------------------

/// Render one comparison plot per heating rate, stacked vertically.
pub fn comparison_plots(ui: &mut Ui, figures: &[ComparisonFigure], palette: &RatePalette) {
    if figures.is_empty() {
        ui.label("Nothing to plot yet.");
        return;
    }

    for figure in figures {
        let raw_color = palette.raw_color(&figure.rate);
        let smoothed_color = palette.smoothed_color(&figure.rate);
        let raw_name = format!("Raw Data ({})", figure.x_name);
        let smoothed_name = format!("Smoothed Data ({})", figure.x_name);

        ui.heading(&figure.title);
        Plot::new(("comparison_plot", &figure.x_name))
            .legend(Legend::default())
            .height(320.0)
            .x_axis_label(X_AXIS_LABEL)
            .y_axis_label(Y_AXIS_LABEL)
            .allow_boxed_zoom(true)
            .allow_drag(true)
            .allow_scroll(false)
            .allow_zoom(true)
            .show(ui, |plot_ui| {
                // Raw data as lines + markers, smoothed as a plain line.
                let raw_line: PlotPoints = figure.raw.iter().copied().collect();
                let raw_markers: PlotPoints = figure.raw.iter().copied().collect();
                let smoothed: PlotPoints = figure.smoothed.iter().copied().collect();

                plot_ui.line(
                    Line::new(raw_line)
                        .name(&raw_name)
                        .color(raw_color)
                        .width(1.0),
                );
                plot_ui.points(
                    Points::new(raw_markers)
                        .name(&raw_name)
                        .color(raw_color)
                        .radius(2.0),
                );
                plot_ui.line(
                    Line::new(smoothed)
                        .name(&smoothed_name)
                        .color(smoothed_color)
                        .width(2.0),
                );
            });
        ui.add_space(16.0);
    }
}
