//! Elliott-style continuation projected from the last zigzag leg.
//!
//! Ratios and day offsets are fixed. Dates advance in calendar days and are
//! not derived from volatility.

use crate::domain::zigzag::Pivot;
use chrono::{Duration, NaiveDate};
use serde::Serialize;
use std::fmt;

pub const RETRACE_RATIO: f64 = 0.382;
pub const EXTENSION_RATIO: f64 = 1.618;
pub const BOUNCE_RATIO: f64 = 0.5;

const IMPULSE_OFFSETS: [i64; 4] = [10, 20, 15, 15];
const CORRECTION_OFFSETS: [i64; 2] = [10, 20];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum WaveLabel {
    Origin,
    Wave2,
    Wave3,
    Wave4,
    Wave5,
    WaveB,
    WaveC,
}

impl fmt::Display for WaveLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            WaveLabel::Origin => "Origin",
            WaveLabel::Wave2 => "W2 (retrace)",
            WaveLabel::Wave3 => "W3 (impulse)",
            WaveLabel::Wave4 => "W4 (retrace)",
            WaveLabel::Wave5 => "W5 (final)",
            WaveLabel::WaveB => "B (bounce)",
            WaveLabel::WaveC => "C (decline)",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WavePoint {
    pub date: NaiveDate,
    pub price: f64,
    pub label: WaveLabel,
}

/// Project the continuation from the last two pivots.
///
/// A rising last leg projects waves 2 to 5; a flat or falling one projects
/// the B/C correction. The first point is always the `Origin` at the last
/// pivot. Fewer than two pivots yields an empty projection.
pub fn project_waves(pivots: &[Pivot]) -> Vec<WavePoint> {
    let [.., prev, last] = pivots else {
        return Vec::new();
    };
    let leg = (last.price - prev.price).abs();

    let mut points = vec![WavePoint {
        date: last.date,
        price: last.price,
        label: WaveLabel::Origin,
    }];

    let targets: Vec<(WaveLabel, f64)> = if last.price > prev.price {
        let w2 = last.price - leg * RETRACE_RATIO;
        let w3 = w2 + leg * EXTENSION_RATIO;
        let w4 = w3 - (w3 - w2) * RETRACE_RATIO;
        let w5 = w4 + leg;
        vec![
            (WaveLabel::Wave2, w2),
            (WaveLabel::Wave3, w3),
            (WaveLabel::Wave4, w4),
            (WaveLabel::Wave5, w5),
        ]
    } else {
        let b = last.price + leg * BOUNCE_RATIO;
        let c = b - leg;
        vec![(WaveLabel::WaveB, b), (WaveLabel::WaveC, c)]
    };

    let offsets: &[i64] = if targets.len() == IMPULSE_OFFSETS.len() {
        &IMPULSE_OFFSETS
    } else {
        &CORRECTION_OFFSETS
    };

    let mut date = last.date;
    for ((label, price), days) in targets.into_iter().zip(offsets) {
        date += Duration::days(*days);
        points.push(WavePoint { date, price, label });
    }
    points
}
