//! Simple Moving Average.
//!
//! SMA(n)[i] = sum(C[i-j] for j in 0..n) / n
//! Warmup: first (n-1) points are NaN. A zero window yields all NaN.

pub fn moving_average(values: &[f64], window: usize) -> Vec<f64> {
    let mut out = Vec::with_capacity(values.len());
    for i in 0..values.len() {
        out.push(window_mean(values, i, window).unwrap_or(f64::NAN));
    }
    out
}

/// Mean of the `window` values ending at `end` (inclusive), if that many exist.
pub fn window_mean(values: &[f64], end: usize, window: usize) -> Option<f64> {
    if window == 0 || end >= values.len() || end + 1 < window {
        return None;
    }
    let slice = &values[end + 1 - window..=end];
    Some(slice.iter().sum::<f64>() / window as f64)
}

/// Latest defined moving-average value.
pub fn latest(values: &[f64], window: usize) -> Option<f64> {
    values
        .len()
        .checked_sub(1)
        .and_then(|end| window_mean(values, end, window))
}
