//! Moving-average deduction forecaster.
//!
//! Answers "which historical close drops out of the N-bar average on each of
//! the coming days, given a simulated path?". History is concatenated with a
//! single deterministic future path; for future offset `i` and window `w` the
//! deduction value is the close at absolute index `history_len + i - w`, and
//! the projected MA is the rolling mean over the concatenated series at
//! `history_len + i`. Uncertainty bands come from separate scenario runs by
//! the caller; the volatility cone here is a fixed heuristic, not a
//! distribution.

use crate::domain::indicator::sma;
use crate::domain::indicator::stddev::return_volatility;
use crate::domain::ohlcv::PriceSeries;
use chrono::NaiveDate;
use serde::Serialize;

pub const DEFAULT_DEDUCTION_WINDOWS: [usize; 2] = [87, 284];
pub const DEFAULT_FORECAST_DAYS: usize = 20;
/// Floor for the volatility cone, in percent per day.
pub const MIN_VOLATILITY_PCT: f64 = 1.5;
const INERTIA_LOOKBACK: usize = 10;

/// `start * (1 + drift)^k` for k in 1..=days.
pub fn exponential_path(start: f64, drift: f64, days: usize) -> Vec<f64> {
    let mut path = Vec::with_capacity(days);
    let mut price = start;
    for _ in 0..days {
        price *= 1.0 + drift;
        path.push(price);
    }
    path
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WindowProjection {
    pub window: usize,
    pub projected_ma: Option<f64>,
    pub deduction_value: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeductionRow {
    /// 1-based offset from the last historical bar.
    pub offset: usize,
    pub date: NaiveDate,
    pub simulated_price: f64,
    pub bull_bound: f64,
    pub bear_bound: f64,
    pub inertia_price: f64,
    pub windows: Vec<WindowProjection>,
}

impl DeductionRow {
    pub fn window(&self, window: usize) -> Option<&WindowProjection> {
        self.windows.iter().find(|w| w.window == window)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DeductionBias {
    /// The next close to drop out is below price: the average tends to rise.
    Supportive,
    /// The next close to drop out is at or above price: the average resists.
    Resistive,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MaReading {
    pub window: usize,
    pub value: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeductionForecast {
    pub last_date: NaiveDate,
    pub last_close: f64,
    pub volatility_pct: f64,
    pub current_ma: Vec<MaReading>,
    pub rows: Vec<DeductionRow>,
}

impl DeductionForecast {
    pub fn current_ma(&self, window: usize) -> Option<f64> {
        self.current_ma
            .iter()
            .find(|m| m.window == window)
            .and_then(|m| m.value)
    }

    pub fn deduction_values(&self, window: usize) -> Vec<Option<f64>> {
        self.rows
            .iter()
            .map(|r| r.window(window).and_then(|w| w.deduction_value))
            .collect()
    }

    pub fn projected_ma(&self, window: usize) -> Vec<Option<f64>> {
        self.rows
            .iter()
            .map(|r| r.window(window).and_then(|w| w.projected_ma))
            .collect()
    }

    /// Mean of the defined deduction values among the first `n` rows.
    pub fn mean_deduction(&self, window: usize, n: usize) -> Option<f64> {
        let defined: Vec<f64> = self
            .deduction_values(window)
            .into_iter()
            .take(n)
            .flatten()
            .collect();
        if defined.is_empty() {
            None
        } else {
            Some(defined.iter().sum::<f64>() / defined.len() as f64)
        }
    }

    /// Lowest defined deduction value among the first `n` rows.
    pub fn min_deduction(&self, window: usize, n: usize) -> Option<f64> {
        self.deduction_values(window)
            .into_iter()
            .take(n)
            .flatten()
            .reduce(f64::min)
    }

    /// Whether tomorrow's drop-out value helps or weighs on the `window` MA.
    pub fn bias(&self, window: usize) -> Option<DeductionBias> {
        let first = self.deduction_values(window).into_iter().next().flatten()?;
        Some(if first < self.last_close {
            DeductionBias::Supportive
        } else {
            DeductionBias::Resistive
        })
    }
}

/// Project `windows` forward along `path`. `None` for an empty history.
pub fn forecast(series: &PriceSeries, path: &[f64], windows: &[usize]) -> Option<DeductionForecast> {
    let last = series.last()?;
    let history = series.closes();
    let n = history.len();

    let mut combined = history.clone();
    combined.extend_from_slice(path);

    let volatility_pct = return_volatility(&history).max(MIN_VOLATILITY_PCT);
    let inertia_slope = if n >= INERTIA_LOOKBACK {
        (last.close - history[n - INERTIA_LOOKBACK]) / INERTIA_LOOKBACK as f64
    } else {
        0.0
    };

    let current_ma = windows
        .iter()
        .map(|&window| MaReading {
            window,
            value: sma::latest(&history, window),
        })
        .collect();

    let rows = path
        .iter()
        .enumerate()
        .map(|(i, &price)| {
            let abs = n + i;
            let step = (i + 1) as f64;
            let spread = volatility_pct / 100.0 * step.sqrt();
            DeductionRow {
                offset: i + 1,
                date: last.date + chrono::Duration::days(step as i64),
                simulated_price: price,
                bull_bound: last.close * (1.0 + spread),
                bear_bound: last.close * (1.0 - spread),
                inertia_price: last.close + inertia_slope * step,
                windows: windows
                    .iter()
                    .map(|&window| WindowProjection {
                        window,
                        projected_ma: sma::window_mean(&combined, abs, window),
                        deduction_value: abs
                            .checked_sub(window)
                            .map(|idx| combined[idx]),
                    })
                    .collect(),
            }
        })
        .collect();

    Some(DeductionForecast {
        last_date: last.date,
        last_close: last.close,
        volatility_pct,
        current_ma,
        rows,
    })
}

/// Forecast along a constant daily drift starting from the last close.
pub fn forecast_with_drift(
    series: &PriceSeries,
    drift: f64,
    days: usize,
    windows: &[usize],
) -> Option<DeductionForecast> {
    let start = series.last()?.close;
    forecast(series, &exponential_path(start, drift, days), windows)
}
