//! Standard deviation indicators.
//!
//! Rolling population standard deviation over n closes:
//! STDDEV(n)[i] = sqrt(sum((C[i-j] - SMA(n)[i])^2 for j in 0..n) / n)
//! Warmup: first (n-1) points are NaN.

use super::pct_change;

pub fn rolling_stddev(values: &[f64], period: usize) -> Vec<f64> {
    let mut out = Vec::with_capacity(values.len());
    for i in 0..values.len() {
        if period == 0 || i + 1 < period {
            out.push(f64::NAN);
            continue;
        }
        let window = &values[i + 1 - period..=i];
        let mean = window.iter().sum::<f64>() / period as f64;
        let variance = window
            .iter()
            .map(|v| {
                let diff = v - mean;
                diff * diff
            })
            .sum::<f64>()
            / period as f64;
        out.push(variance.sqrt());
    }
    out
}

/// Sample standard deviation (n-1 denominator) of the defined values.
/// Fewer than two defined values yield 0.
pub fn sample_stddev(values: &[f64]) -> f64 {
    let defined: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if defined.len() < 2 {
        return 0.0;
    }
    let n = defined.len() as f64;
    let mean = defined.iter().sum::<f64>() / n;
    let variance = defined.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
    variance.sqrt()
}

/// Historical volatility of daily percentage changes, in percent.
pub fn return_volatility(closes: &[f64]) -> f64 {
    sample_stddev(&pct_change(closes)) * 100.0
}
