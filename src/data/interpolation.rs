//! Piecewise-linear interpolation with flat extrapolation.
//!
//! Training points are sorted by x and duplicate x values are collapsed to
//! the mean of their y values, so the knots are strictly increasing. Queries
//! left of the first knot return the first y, queries right of the last knot
//! return the last y. A missing query returns missing.

use super::model::is_missing;

/// Collect the rows where both `x` and `y` are finite, ordered by x, with
/// duplicate x values averaged.
pub fn training_points(x: &[f64], y: &[f64]) -> (Vec<f64>, Vec<f64>) {
    let mut points: Vec<(f64, f64)> = x
        .iter()
        .zip(y)
        .filter(|(xi, yi)| xi.is_finite() && yi.is_finite())
        .map(|(xi, yi)| (*xi, *yi))
        .collect();

    // Stable, so tied x keep their original relative order.
    points.sort_by(|a, b| a.0.total_cmp(&b.0));

    let mut xs: Vec<f64> = Vec::with_capacity(points.len());
    let mut ys: Vec<f64> = Vec::with_capacity(points.len());
    let mut i = 0;
    while i < points.len() {
        let xi = points[i].0;
        let mut j = i;
        let mut sum = 0.0;
        while j < points.len() && points[j].0 == xi {
            sum += points[j].1;
            j += 1;
        }
        xs.push(xi);
        ys.push(sum / (j - i) as f64);
        i = j;
    }
    (xs, ys)
}

/// Monotonic piecewise-linear interpolant over strictly increasing knots.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearInterpolant {
    xs: Vec<f64>,
    ys: Vec<f64>,
}

impl LinearInterpolant {
    /// Build from strictly increasing `xs`. Returns `None` without knots.
    pub fn new(xs: Vec<f64>, ys: Vec<f64>) -> Option<Self> {
        if xs.is_empty() || xs.len() != ys.len() {
            return None;
        }
        debug_assert!(xs.windows(2).all(|w| w[0] < w[1]));
        Some(LinearInterpolant { xs, ys })
    }

    /// Sort, deduplicate and build in one step.
    pub fn fit(x: &[f64], y: &[f64]) -> Option<Self> {
        let (xs, ys) = training_points(x, y);
        LinearInterpolant::new(xs, ys)
    }

    pub fn knots(&self) -> usize {
        self.xs.len()
    }

    pub fn eval(&self, x: f64) -> f64 {
        if is_missing(x) {
            return f64::NAN;
        }
        let last = self.xs.len() - 1;
        if x <= self.xs[0] {
            return self.ys[0];
        }
        if x >= self.xs[last] {
            return self.ys[last];
        }

        // First knot strictly greater than x; 1 <= j <= last here.
        let j = self.xs.partition_point(|&knot| knot <= x);
        let (x0, x1) = (self.xs[j - 1], self.xs[j]);
        let (y0, y1) = (self.ys[j - 1], self.ys[j]);
        y0 + (y1 - y0) * (x - x0) / (x1 - x0)
    }

    pub fn eval_all(&self, x: &[f64]) -> Vec<f64> {
        x.iter().map(|&xi| self.eval(xi)).collect()
    }
}
