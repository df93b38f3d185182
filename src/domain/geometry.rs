//! Multi-horizon geometric trend vector.
//!
//! Each horizon fits `ln(close)` against the bar index over the trailing
//! window (or the whole history when shorter) and maps the slope to an
//! angle. The default horizons count months, so callers usually feed a
//! monthly resample.

use crate::domain::indicator::regression::{angle, fit_points, log_points};
use crate::domain::ohlcv::PriceSeries;
use serde::Serialize;
use std::fmt;

/// Bars per horizon in [`Horizon::ALL`] order.
pub const DEFAULT_HORIZONS: [usize; 7] = [420, 120, 60, 36, 12, 6, 3];
/// Minimum points for a fit; shorter windows report the zero fit.
pub const MIN_FIT_POINTS: usize = 3;
/// The long horizon must be below this angle for a reversal signal.
pub const REVERSAL_LONG_ANGLE: f64 = 0.0;
/// The six-month angle must exceed this for a reversal signal.
pub const REVERSAL_SHORT_ANGLE: f64 = 25.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Horizon {
    #[serde(rename = "35Y")]
    Y35,
    #[serde(rename = "10Y")]
    Y10,
    #[serde(rename = "5Y")]
    Y5,
    #[serde(rename = "3Y")]
    Y3,
    #[serde(rename = "1Y")]
    Y1,
    #[serde(rename = "6M")]
    M6,
    #[serde(rename = "3M")]
    M3,
}

impl Horizon {
    pub const ALL: [Horizon; 7] = [
        Horizon::Y35,
        Horizon::Y10,
        Horizon::Y5,
        Horizon::Y3,
        Horizon::Y1,
        Horizon::M6,
        Horizon::M3,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Horizon::Y35 => "35Y",
            Horizon::Y10 => "10Y",
            Horizon::Y5 => "5Y",
            Horizon::Y3 => "3Y",
            Horizon::Y1 => "1Y",
            Horizon::M6 => "6M",
            Horizon::M3 => "3M",
        }
    }

    fn position(&self) -> usize {
        *self as usize
    }

    pub fn default_bars(&self) -> usize {
        DEFAULT_HORIZONS[self.position()]
    }
}

impl fmt::Display for Horizon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct TrendFit {
    pub angle: f64,
    pub r_squared: f64,
    pub slope: f64,
}

impl TrendFit {
    /// Fit the trailing `bars` closes; the whole slice when shorter. Only
    /// finite, positive closes count toward the minimum point count.
    pub fn over_tail(closes: &[f64], bars: usize) -> Self {
        let start = closes.len().saturating_sub(bars);
        let points = log_points(&closes[start..]);
        if points.len() < MIN_FIT_POINTS {
            return TrendFit::default();
        }
        let reg = fit_points(&points);
        TrendFit {
            angle: angle(reg.slope),
            r_squared: reg.r_squared,
            slope: reg.slope,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HorizonFit {
    pub horizon: Horizon,
    pub bars: usize,
    #[serde(flatten)]
    pub fit: TrendFit,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeometryVector {
    pub fits: Vec<HorizonFit>,
    /// 3M angle minus 1Y angle.
    pub acceleration: f64,
    /// Long-term decline with a strong six-month climb.
    pub reversal_signal: bool,
}

impl GeometryVector {
    /// Build from fits in [`Horizon::ALL`] order, deriving acceleration and
    /// the reversal signal.
    pub fn from_fits(fits: [TrendFit; 7], bars: [usize; 7]) -> Self {
        let fits: Vec<HorizonFit> = Horizon::ALL
            .iter()
            .zip(fits.iter().zip(bars.iter()))
            .map(|(&horizon, (&fit, &bars))| HorizonFit { horizon, bars, fit })
            .collect();
        let mut vector = GeometryVector {
            fits,
            acceleration: 0.0,
            reversal_signal: false,
        };
        vector.acceleration = vector.angle(Horizon::M3) - vector.angle(Horizon::Y1);
        vector.reversal_signal = vector.angle(Horizon::Y10) < REVERSAL_LONG_ANGLE
            && vector.angle(Horizon::M6) > REVERSAL_SHORT_ANGLE;
        vector
    }

    /// Fit every horizon over `closes`.
    pub fn from_closes(closes: &[f64], horizons: &[usize; 7]) -> Self {
        let fits = horizons.map(|bars| TrendFit::over_tail(closes, bars));
        Self::from_fits(fits, *horizons)
    }

    pub fn fit(&self, horizon: Horizon) -> TrendFit {
        self.fits
            .iter()
            .find(|f| f.horizon == horizon)
            .map(|f| f.fit)
            .unwrap_or_default()
    }

    pub fn angle(&self, horizon: Horizon) -> f64 {
        self.fit(horizon).angle
    }

    pub fn r_squared(&self, horizon: Horizon) -> f64 {
        self.fit(horizon).r_squared
    }
}

/// Geometry of `series`, on month-end closes when `monthly` is set.
pub fn compute_geometry(series: &PriceSeries, horizons: &[usize; 7], monthly: bool) -> GeometryVector {
    let closes = if monthly {
        series.to_monthly().closes()
    } else {
        series.closes()
    };
    GeometryVector::from_closes(&closes, horizons)
}
