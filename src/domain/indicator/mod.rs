//! Technical indicator implementations.
//!
//! Indicators are pure functions over close slices. Rolling outputs are
//! aligned with their input and carry `f64::NAN` through the warmup prefix;
//! they never fail on short input.
//!
//! - [`sma`]: rolling arithmetic mean
//! - [`stddev`]: rolling population deviation and return volatility
//! - [`regression`]: OLS and log-price regression, slope-to-angle mapping
//! - [`trend`]: MA slope, bias, crosses and the Granville classifier

pub mod regression;
pub mod sma;
pub mod stddev;
pub mod trend;

use std::collections::HashMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum IndicatorType {
    Sma(usize),
    Stddev(usize),
}

impl IndicatorType {
    pub fn window(&self) -> usize {
        match self {
            IndicatorType::Sma(w) | IndicatorType::Stddev(w) => *w,
        }
    }

    pub fn calculate(&self, closes: &[f64]) -> Vec<f64> {
        match self {
            IndicatorType::Sma(w) => sma::moving_average(closes, *w),
            IndicatorType::Stddev(w) => stddev::rolling_stddev(closes, *w),
        }
    }
}

impl fmt::Display for IndicatorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorType::Sma(period) => write!(f, "SMA({})", period),
            IndicatorType::Stddev(period) => write!(f, "STDDEV({})", period),
        }
    }
}

/// Compute each requested indicator once over `closes`.
pub fn compute_indicators(
    closes: &[f64],
    types: &[IndicatorType],
) -> HashMap<IndicatorType, Vec<f64>> {
    let mut out = HashMap::with_capacity(types.len());
    for t in types {
        out.entry(*t).or_insert_with(|| t.calculate(closes));
    }
    out
}

/// Simple percentage change; the first element is NaN, as are changes from a
/// zero base.
pub fn pct_change(values: &[f64]) -> Vec<f64> {
    let mut out = Vec::with_capacity(values.len());
    for i in 0..values.len() {
        if i == 0 || values[i - 1] == 0.0 {
            out.push(f64::NAN);
        } else {
            out.push(values[i] / values[i - 1] - 1.0);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indicator_type_display() {
        assert_eq!(IndicatorType::Sma(87).to_string(), "SMA(87)");
        assert_eq!(IndicatorType::Stddev(20).to_string(), "STDDEV(20)");
    }

    #[test]
    fn compute_indicators_dedupes() {
        let closes: Vec<f64> = (1..=30).map(|v| v as f64).collect();
        let types = [
            IndicatorType::Sma(20),
            IndicatorType::Sma(5),
            IndicatorType::Sma(20),
        ];
        let map = compute_indicators(&closes, &types);
        assert_eq!(map.len(), 2);
        assert_eq!(map[&IndicatorType::Sma(20)].len(), 30);
        assert!((map[&IndicatorType::Sma(5)][29] - 28.0).abs() < 1e-12);
    }

    #[test]
    fn pct_change_first_is_nan() {
        let changes = pct_change(&[100.0, 110.0, 99.0]);
        assert!(changes[0].is_nan());
        assert!((changes[1] - 0.10).abs() < 1e-12);
        assert!((changes[2] - (-0.10)).abs() < 1e-12);
    }

    #[test]
    fn pct_change_zero_base_is_nan() {
        let changes = pct_change(&[0.0, 1.0]);
        assert!(changes[1].is_nan());
    }
}
