use std::collections::BTreeMap;

use cte_despike::{HeatingRate, WideTable};
use eframe::egui::Color32;
use palette::{Hsl, IntoColor, Srgb};

// ---------------------------------------------------------------------------
// Color palette generator
// ---------------------------------------------------------------------------

fn hsl_color(hue: f32, saturation: f32, lightness: f32) -> Color32 {
    let rgb: Srgb = Hsl::new(hue, saturation, lightness).into_color();
    Color32::from_rgb(
        (rgb.red * 255.0) as u8,
        (rgb.green * 255.0) as u8,
        (rgb.blue * 255.0) as u8,
    )
}

fn evenly_spaced_hues(n: usize) -> Vec<f32> {
    (0..n).map(|i| (i as f32 / n as f32) * 360.0).collect()
}

// ---------------------------------------------------------------------------
// Heating rate → colours
// ---------------------------------------------------------------------------

/// One hue per heating rate: a pale shade for raw data and a strong shade
/// for the smoothed curve.
#[derive(Debug, Clone)]
pub struct RatePalette {
    mapping: BTreeMap<HeatingRate, (Color32, Color32)>,
    default_colors: (Color32, Color32),
}

impl Default for RatePalette {
    fn default() -> Self {
        Self {
            mapping: BTreeMap::new(),
            default_colors: (Color32::GRAY, Color32::LIGHT_BLUE),
        }
    }
}

impl RatePalette {
    /// Build from the rates of a table's Temperature columns, in column order.
    pub fn for_table(table: &WideTable) -> Self {
        let mut rates: Vec<&HeatingRate> = Vec::new();
        for column in table.columns().iter().step_by(2) {
            if !rates.contains(&&column.key.rate) {
                rates.push(&column.key.rate);
            }
        }

        let mapping = rates
            .iter()
            .zip(evenly_spaced_hues(rates.len()))
            .map(|(rate, hue)| {
                let raw = hsl_color(hue, 0.35, 0.70);
                let smoothed = hsl_color(hue, 0.75, 0.45);
                ((*rate).clone(), (raw, smoothed))
            })
            .collect();

        Self {
            mapping,
            ..Self::default()
        }
    }

    pub fn raw_color(&self, rate: &HeatingRate) -> Color32 {
        self.mapping.get(rate).unwrap_or(&self.default_colors).0
    }

    pub fn smoothed_color(&self, rate: &HeatingRate) -> Color32 {
        self.mapping.get(rate).unwrap_or(&self.default_colors).1
    }
}
