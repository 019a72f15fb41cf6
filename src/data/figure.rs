use super::error::TableError;
use super::model::{HeatingRate, WideTable};
use super::pairing::pair_columns;

pub const X_AXIS_LABEL: &str = "Temperature (°C)";
pub const Y_AXIS_LABEL: &str = "Coefficient of Thermal Expansion (CTE)";

/// Raw and smoothed series of one heating rate, ready to plot.
#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonFigure {
    pub rate: HeatingRate,
    pub title: String,
    pub x_name: String,
    pub y_name: String,
    /// Finite `[x, y]` points of the uploaded data.
    pub raw: Vec<[f64; 2]>,
    /// Finite `[x, y]` points after smoothing.
    pub smoothed: Vec<[f64; 2]>,
}

/// One figure per (Temperature, CTE) pair of `raw`, matched by column name
/// against `smoothed`.
pub fn comparison_figures(
    raw: &WideTable,
    smoothed: &WideTable,
) -> Result<Vec<ComparisonFigure>, TableError> {
    let pairs = pair_columns(&raw.column_names())?;
    let mut figures = Vec::with_capacity(pairs.len());

    for pair in pairs {
        let raw_x = &raw.columns()[pair.x_position()];
        let raw_y = &raw.columns()[pair.y_position()];
        let (Some(smooth_x), Some(smooth_y)) =
            (smoothed.column(&pair.x_name), smoothed.column(&pair.y_name))
        else {
            let missing = [&pair.x_name, &pair.y_name]
                .into_iter()
                .filter(|name| smoothed.column(name).is_none())
                .cloned()
                .collect();
            return Err(TableError::ColumnMismatch {
                missing,
                unexpected: Vec::new(),
                duplicated: Vec::new(),
            });
        };

        let rate = raw_x.key.rate.clone();
        figures.push(ComparisonFigure {
            title: format!("Despiking Analysis at {rate} Heating Rate"),
            rate,
            raw: finite_points(&raw_x.values, &raw_y.values),
            smoothed: finite_points(&smooth_x.values, &smooth_y.values),
            x_name: pair.x_name,
            y_name: pair.y_name,
        });
    }
    Ok(figures)
}

fn finite_points(x: &[f64], y: &[f64]) -> Vec<[f64; 2]> {
    x.iter()
        .zip(y)
        .filter(|(xi, yi)| xi.is_finite() && yi.is_finite())
        .map(|(&xi, &yi)| [xi, yi])
        .collect()
}
