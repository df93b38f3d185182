//! Ordinary least squares against the bar index, and the slope-to-angle
//! mapping used by the geometric trend classifier.

use serde::Serialize;

/// Slope multiplier for [`angle`]: a log-slope of 0.01 per bar maps to 45°.
pub const ANGLE_SCALE: f64 = 100.0;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Regression {
    pub slope: f64,
    pub intercept: f64,
    pub r_squared: f64,
}

impl Regression {
    pub fn predict(&self, index: f64) -> f64 {
        self.intercept + self.slope * index
    }
}

/// Fit `y = intercept + slope * i` over `i = 0..y.len()`.
///
/// Fewer than two points, or a non-finite input, yields the all-zero fit.
/// A constant `y` has slope 0 and r² 0.
pub fn linear_regression(y: &[f64]) -> Regression {
    let points: Vec<(f64, f64)> = y.iter().enumerate().map(|(i, &v)| (i as f64, v)).collect();
    fit_points(&points)
}

/// OLS over explicit `(x, y)` points, with the same degenerate cases as
/// [`linear_regression`].
pub fn fit_points(points: &[(f64, f64)]) -> Regression {
    if points.len() < 2 || points.iter().any(|(x, y)| !x.is_finite() || !y.is_finite()) {
        return Regression::default();
    }

    let n = points.len() as f64;
    let mean_x = points.iter().map(|(x, _)| x).sum::<f64>() / n;
    let mean_y = points.iter().map(|(_, y)| y).sum::<f64>() / n;

    let mut sxx = 0.0;
    let mut sxy = 0.0;
    let mut syy = 0.0;
    for &(x, y) in points {
        let dx = x - mean_x;
        let dy = y - mean_y;
        sxx += dx * dx;
        sxy += dx * dy;
        syy += dy * dy;
    }

    if sxx == 0.0 {
        return Regression::default();
    }

    let slope = sxy / sxx;
    let intercept = mean_y - slope * mean_x;
    let r_squared = if syy > 0.0 {
        ((sxy * sxy) / (sxx * syy)).clamp(0.0, 1.0)
    } else {
        0.0
    };

    Regression {
        slope,
        intercept,
        r_squared,
    }
}

/// `(bar index, ln(close))` for every finite, positive close. Dropped bars
/// leave gaps in x rather than shifting later bars.
pub fn log_points(closes: &[f64]) -> Vec<(f64, f64)> {
    closes
        .iter()
        .enumerate()
        .filter(|(_, c)| c.is_finite() && **c > 0.0)
        .map(|(i, c)| (i as f64, c.ln()))
        .collect()
}

/// Regress `ln(close)` on the bar index over [`log_points`].
pub fn log_linear_regression(closes: &[f64]) -> Regression {
    fit_points(&log_points(closes))
}

/// Map a per-bar log slope to degrees in [-90, 90]. NaN maps to 0.
pub fn angle(slope: f64) -> f64 {
    if slope.is_nan() {
        return 0.0;
    }
    (slope * ANGLE_SCALE).atan().to_degrees().clamp(-90.0, 90.0)
}
