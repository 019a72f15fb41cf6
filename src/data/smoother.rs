use crate::config::SmoothingConfig;

use super::interpolation::{training_points, LinearInterpolant};
use super::model::is_missing;

/// Series with this many present values or fewer are left untouched.
pub const DEFAULT_MIN_POINTS: usize = 10;

/// Residual limit in units of the series' noise scale.
pub const DEFAULT_SPIKE_THRESHOLD: f64 = 6.0;

/// Converts a median absolute deviation into a normal-equivalent sigma.
const MAD_TO_SIGMA: f64 = 1.4826;

/// Lower bound on the noise scale relative to the largest |y|, so rounding
/// noise on exactly linear data is never taken for a spike.
const RELATIVE_SCALE_FLOOR: f64 = 1e-9;

// ---------------------------------------------------------------------------
// SmoothedSeries
// ---------------------------------------------------------------------------

/// Output of one smoothing pass.
#[derive(Debug, Clone, PartialEq)]
pub struct SmoothedSeries {
    /// Same length and row alignment as the input y.
    pub values: Vec<f64>,
    /// Whether the series passed the point-count guard and was rebuilt.
    pub applied: bool,
    /// Training points dropped as spikes.
    pub rejected: usize,
}

impl SmoothedSeries {
    fn unchanged(y: &[f64]) -> Self {
        SmoothedSeries {
            values: y.to_vec(),
            applied: false,
            rejected: 0,
        }
    }
}

// ---------------------------------------------------------------------------
// SeriesSmoother
// ---------------------------------------------------------------------------

/// Despikes one dependent series against its independent series.
///
/// 1. Rows with a missing (or non-finite) x or y are dropped from training.
/// 2. Training points are sorted by x, tied x averaged, and spikes rejected
///    one at a time: the point deviating most from the chord through its
///    neighbours goes first, until none exceeds `spike_threshold` times the
///    noise scale.
/// 3. A piecewise-linear interpolant through the survivors is evaluated at
///    every original x. Missing x stays missing; beyond the training range
///    the first/last value is held.
///
/// Series with `min_points` present y values or fewer are returned as is.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeriesSmoother {
    min_points: usize,
    spike_threshold: Option<f64>,
}

impl Default for SeriesSmoother {
    fn default() -> Self {
        Self {
            min_points: DEFAULT_MIN_POINTS,
            spike_threshold: Some(DEFAULT_SPIKE_THRESHOLD),
        }
    }
}

impl SeriesSmoother {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &SmoothingConfig) -> Self {
        Self {
            min_points: config.min_points,
            spike_threshold: config.spike_threshold,
        }
    }

    pub fn with_min_points(mut self, min_points: usize) -> Self {
        self.min_points = min_points;
        self
    }

    /// `None` turns spike rejection off, leaving plain interpolation.
    pub fn with_spike_threshold(mut self, threshold: Option<f64>) -> Self {
        self.spike_threshold = threshold;
        self
    }

    pub fn min_points(&self) -> usize {
        self.min_points
    }

    pub fn spike_threshold(&self) -> Option<f64> {
        self.spike_threshold
    }

    /// Despiked copy of `y`, aligned with `x`.
    pub fn smooth(&self, x: &[f64], y: &[f64]) -> Vec<f64> {
        self.smooth_series(x, y).values
    }

    pub fn smooth_series(&self, x: &[f64], y: &[f64]) -> SmoothedSeries {
        let present = y.iter().filter(|v| !is_missing(**v)).count();
        if present <= self.min_points {
            return SmoothedSeries::unchanged(y);
        }

        let (mut xs, mut ys) = training_points(x, y);
        let rejected = match self.spike_threshold {
            Some(threshold) => reject_spikes(&mut xs, &mut ys, threshold),
            None => 0,
        };

        let Some(interpolant) = LinearInterpolant::new(xs, ys) else {
            return SmoothedSeries::unchanged(y);
        };

        let values = (0..y.len())
            .map(|i| match x.get(i) {
                Some(&xi) => interpolant.eval(xi),
                None => f64::NAN,
            })
            .collect();

        SmoothedSeries {
            values,
            applied: true,
            rejected,
        }
    }
}

// ---------------------------------------------------------------------------
// Spike rejection
// ---------------------------------------------------------------------------

/// Remove spikes from sorted, strictly increasing training points in place.
/// Returns the number of points removed.
fn reject_spikes(xs: &mut Vec<f64>, ys: &mut Vec<f64>, threshold: f64) -> usize {
    if xs.len() < 3 {
        return 0;
    }

    let limit = threshold * noise_scale(xs, ys);
    let max_rejections = xs.len() / 2;
    let mut rejected = 0;

    while rejected < max_rejections && xs.len() >= 3 {
        let worst = chord_residuals(xs, ys)
            .into_iter()
            .map(f64::abs)
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(&b.1));

        match worst {
            Some((index, magnitude)) if magnitude > limit => {
                let index = confirm_candidate(xs, ys, index);
                xs.remove(index);
                ys.remove(index);
                rejected += 1;
            }
            _ => break,
        }
    }
    rejected
}

/// An end point is scored by extrapolating from the next two points, so a
/// spike among those inflates the end point's residual. Among the end point
/// and those two, remove whichever leaves the smallest worst residual; ties
/// keep the end point.
fn confirm_candidate(xs: &[f64], ys: &[f64], index: usize) -> usize {
    let n = xs.len();
    if n < 4 || (index != 0 && index != n - 1) {
        return index;
    }
    let candidates = if index == 0 {
        [0, 1, 2]
    } else {
        [n - 1, n - 2, n - 3]
    };

    let mut best = (index, f64::INFINITY);
    for candidate in candidates {
        let worst = worst_residual_without(xs, ys, candidate);
        if worst < best.1 {
            best = (candidate, worst);
        }
    }
    best.0
}

fn worst_residual_without(xs: &[f64], ys: &[f64], skip: usize) -> f64 {
    let keep = |(i, _): &(usize, &f64)| *i != skip;
    let xs: Vec<f64> = xs.iter().enumerate().filter(keep).map(|(_, v)| *v).collect();
    let ys: Vec<f64> = ys.iter().enumerate().filter(keep).map(|(_, v)| *v).collect();
    chord_residuals(&xs, &ys)
        .into_iter()
        .fold(0.0_f64, |m, r| m.max(r.abs()))
}

/// Robust noise scale of the series: the larger of the residual sigma and the
/// typical step between neighbouring points.
fn noise_scale(xs: &[f64], ys: &[f64]) -> f64 {
    let residuals: Vec<f64> = chord_residuals(xs, ys).into_iter().map(f64::abs).collect();
    let steps: Vec<f64> = ys.windows(2).map(|w| (w[1] - w[0]).abs()).collect();
    let magnitude = ys.iter().fold(0.0_f64, |m, v| m.max(v.abs()));

    (MAD_TO_SIGMA * median(residuals))
        .max(median(steps))
        .max(magnitude * RELATIVE_SCALE_FLOOR)
}

/// Deviation of each point from the line through its two nearest neighbours
/// (both sides inside, one side at the ends). Needs at least three points.
fn chord_residuals(xs: &[f64], ys: &[f64]) -> Vec<f64> {
    let n = xs.len();
    (0..n)
        .map(|k| {
            let (a, b) = if k == 0 {
                (1, 2)
            } else if k == n - 1 {
                (n - 3, n - 2)
            } else {
                (k - 1, k + 1)
            };
            ys[k] - line_through(xs[a], ys[a], xs[b], ys[b], xs[k])
        })
        .collect()
}

fn line_through(x0: f64, y0: f64, x1: f64, y1: f64, x: f64) -> f64 {
    y0 + (y1 - y0) * (x - x0) / (x1 - x0)
}

fn median(mut values: Vec<f64>) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.sort_by(|a, b| a.total_cmp(b));
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        (values[mid - 1] + values[mid]) / 2.0
    } else {
        values[mid]
    }
}
