//! Moving-average trend helpers: slope, bias, crossovers, trend persistence
//! and Granville's eight-rule reading of price against a moving average.

use super::sma;
use crate::domain::ohlcv::PriceSeries;
use serde::Serialize;
use std::fmt;

/// Bars between the two MA readings used for slope.
pub const DEFAULT_SLOPE_LAG: usize = 5;
/// MA slope beyond which the average counts as rising or falling.
pub const SLOPE_THRESHOLD: f64 = 0.3;

/// MA change over the last `lag` bars, `None` when either end is undefined.
pub fn ma_slope(ma: &[f64], lag: usize) -> Option<f64> {
    let last = ma.len().checked_sub(1)?;
    let prev = last.checked_sub(lag)?;
    let (now, then) = (ma[last], ma[prev]);
    (now.is_finite() && then.is_finite()).then_some(now - then)
}

/// Percentage distance of price from its MA; 0 when the MA is not positive.
pub fn bias_pct(price: f64, ma: f64) -> f64 {
    if ma > 0.0 && ma.is_finite() {
        (price - ma) / ma * 100.0
    } else {
        0.0
    }
}

/// Latest reading of one moving average against the last close.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MaSnapshot {
    pub window: usize,
    pub value: Option<f64>,
    pub bias_pct: Option<f64>,
    pub slope: Option<f64>,
}

/// Value, bias and slope of each MA in `windows` at the last bar.
pub fn ma_snapshot(series: &PriceSeries, windows: &[usize]) -> Vec<MaSnapshot> {
    let closes = series.closes();
    let close = closes.last().copied();
    windows
        .iter()
        .map(|&window| {
            let ma = sma::moving_average(&closes, window);
            let value = ma.last().copied().filter(|v| v.is_finite());
            MaSnapshot {
                window,
                value,
                bias_pct: close.zip(value).map(|(c, v)| bias_pct(c, v)),
                slope: ma_slope(&ma, DEFAULT_SLOPE_LAG),
            }
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CrossEvent {
    None,
    Golden,
    Death,
}

/// Per-bar crossover events between two aligned MA series.
///
/// Golden: previous fast <= slow and current fast > slow. Death is the mirror.
/// Bars where any of the four readings is undefined report `None`.
pub fn cross_events(fast: &[f64], slow: &[f64]) -> Vec<CrossEvent> {
    let n = fast.len().min(slow.len());
    let mut events = vec![CrossEvent::None; n];
    for i in 1..n {
        let (f0, s0, f1, s1) = (fast[i - 1], slow[i - 1], fast[i], slow[i]);
        if ![f0, s0, f1, s1].iter().all(|v| v.is_finite()) {
            continue;
        }
        if f0 <= s0 && f1 > s1 {
            events[i] = CrossEvent::Golden;
        } else if f0 >= s0 && f1 < s1 {
            events[i] = CrossEvent::Death;
        }
    }
    events
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TrendPersistence {
    pub bullish: bool,
    pub bars: usize,
}

/// Current fast-vs-slow regime and how many consecutive bars it has held.
/// `None` until both averages are defined on the last bar.
pub fn trend_persistence(fast: &[f64], slow: &[f64]) -> Option<TrendPersistence> {
    let n = fast.len().min(slow.len());
    let last = n.checked_sub(1)?;
    if !(fast[last].is_finite() && slow[last].is_finite()) {
        return None;
    }
    let bullish = fast[last] > slow[last];
    // Undefined bars compare false, matching a bearish reading.
    let bars = (0..n)
        .rev()
        .take_while(|&i| (fast[i] > slow[i]) == bullish)
        .count();
    Some(TrendPersistence { bullish, bars })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum GranvilleSignal {
    Overheated,
    Oversold,
    /// G1: close breaks above a non-falling MA from an open below it.
    Breakout,
    /// G2: close dips under a rising MA.
    FalseBreakdown,
    /// G3: close holds just above a rising MA.
    SupportRetest,
    /// G4: close breaks below a non-rising MA from an open above it.
    Breakdown,
    /// G5: close pokes above a falling MA.
    FalseBreakout,
    /// G6: close stalls just under a falling MA.
    Resistance,
    Consolidation,
}

impl GranvilleSignal {
    pub fn is_buy(&self) -> bool {
        matches!(
            self,
            GranvilleSignal::Breakout
                | GranvilleSignal::FalseBreakdown
                | GranvilleSignal::SupportRetest
        )
    }

    pub fn is_sell(&self) -> bool {
        matches!(
            self,
            GranvilleSignal::Breakdown | GranvilleSignal::FalseBreakout | GranvilleSignal::Resistance
        )
    }
}

impl fmt::Display for GranvilleSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            GranvilleSignal::Overheated => "overheated (bias > 25%)",
            GranvilleSignal::Oversold => "oversold (bias < -25%)",
            GranvilleSignal::Breakout => "G1 breakout buy",
            GranvilleSignal::FalseBreakdown => "G2 false breakdown buy",
            GranvilleSignal::SupportRetest => "G3 support retest",
            GranvilleSignal::Breakdown => "G4 breakdown sell",
            GranvilleSignal::FalseBreakout => "G5 false breakout sell",
            GranvilleSignal::Resistance => "G6 rebound into resistance",
            GranvilleSignal::Consolidation => "consolidation",
        };
        f.write_str(s)
    }
}

/// Classify the latest bar against its MA. Rules are checked in order and
/// the first match wins.
pub fn granville(close: f64, open: f64, ma: f64, ma_prev: f64) -> GranvilleSignal {
    let slope = ma - ma_prev;
    let bias = bias_pct(close, ma);
    let rising = slope > SLOPE_THRESHOLD;
    let falling = slope < -SLOPE_THRESHOLD;

    if bias > 25.0 {
        GranvilleSignal::Overheated
    } else if bias < -25.0 {
        GranvilleSignal::Oversold
    } else if close > ma && open < ma && !falling {
        GranvilleSignal::Breakout
    } else if close < ma && rising {
        GranvilleSignal::FalseBreakdown
    } else if close > ma && bias < 3.0 && rising {
        GranvilleSignal::SupportRetest
    } else if close < ma && open > ma && !rising {
        GranvilleSignal::Breakdown
    } else if close > ma && falling {
        GranvilleSignal::FalseBreakout
    } else if close < ma && bias > -3.0 && falling {
        GranvilleSignal::Resistance
    } else {
        GranvilleSignal::Consolidation
    }
}

/// Granville reading of the last bar of `series` against its `window` MA.
/// The lagged MA falls back to the current one when undefined.
pub fn granville_latest(series: &PriceSeries, window: usize, lag: usize) -> Option<GranvilleSignal> {
    let bar = series.last()?;
    let ma = sma::moving_average(&series.closes(), window);
    let now = *ma.last()?;
    if !now.is_finite() {
        return None;
    }
    let prev = ma
        .len()
        .checked_sub(lag + 1)
        .map(|i| ma[i])
        .filter(|v| v.is_finite())
        .unwrap_or(now);
    Some(granville(bar.close, bar.open, now, prev))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn slope_over_lag() {
        let ma = [f64::NAN, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        assert_eq!(ma_slope(&ma, 5), Some(5.0));
        assert_eq!(ma_slope(&ma, 6), None);
        assert_eq!(ma_slope(&[], 1), None);
    }

    #[test]
    fn bias_guards_zero_ma() {
        assert!((bias_pct(110.0, 100.0) - 10.0).abs() < 1e-12);
        assert_eq!(bias_pct(110.0, 0.0), 0.0);
        assert_eq!(bias_pct(110.0, f64::NAN), 0.0);
    }

    #[test]
    fn snapshot_per_window() {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let closes: Vec<f64> = (1..=30).map(|v| v as f64).collect();
        let series = PriceSeries::from_closes(start, &closes).unwrap();
        let readings = ma_snapshot(&series, &[10, 50]);

        assert_eq!(readings[0].window, 10);
        assert!((readings[0].value.unwrap() - 25.5).abs() < 1e-12);
        assert!((readings[0].bias_pct.unwrap() - (30.0 - 25.5) / 25.5 * 100.0).abs() < 1e-9);
        assert!((readings[0].slope.unwrap() - 5.0).abs() < 1e-12);
        assert_eq!(readings[1].value, None);
        assert_eq!(readings[1].bias_pct, None);
        assert_eq!(readings[1].slope, None);
    }

    #[test]
    fn golden_and_death_crosses() {
        let fast = [f64::NAN, 1.0, 3.0, 3.0, 1.0];
        let slow = [f64::NAN, 2.0, 2.0, 2.0, 2.0];
        let events = cross_events(&fast, &slow);
        assert_eq!(
            events,
            vec![
                CrossEvent::None,
                CrossEvent::None,
                CrossEvent::Golden,
                CrossEvent::None,
                CrossEvent::Death,
            ]
        );
    }

    #[test]
    fn persistence_counts_consecutive_bars() {
        let fast = [1.0, 3.0, 3.0, 3.0];
        let slow = [2.0, 2.0, 2.0, 2.0];
        let p = trend_persistence(&fast, &slow).unwrap();
        assert!(p.bullish);
        assert_eq!(p.bars, 3);
    }

    #[test]
    fn persistence_needs_defined_tail() {
        assert!(trend_persistence(&[f64::NAN], &[1.0]).is_none());
    }

    #[test]
    fn granville_overheated_wins_first() {
        assert_eq!(granville(130.0, 90.0, 100.0, 90.0), GranvilleSignal::Overheated);
        assert_eq!(granville(70.0, 90.0, 100.0, 90.0), GranvilleSignal::Oversold);
    }

    #[test]
    fn granville_rules() {
        assert_eq!(granville(101.0, 99.0, 100.0, 100.0), GranvilleSignal::Breakout);
        assert_eq!(granville(99.0, 99.5, 100.0, 99.0), GranvilleSignal::FalseBreakdown);
        assert_eq!(granville(101.0, 101.0, 100.0, 99.0), GranvilleSignal::SupportRetest);
        assert_eq!(granville(99.0, 101.0, 100.0, 100.0), GranvilleSignal::Breakdown);
        assert_eq!(granville(104.0, 104.0, 100.0, 101.0), GranvilleSignal::FalseBreakout);
        assert_eq!(granville(99.0, 99.0, 100.0, 101.0), GranvilleSignal::Resistance);
        assert_eq!(granville(105.0, 105.0, 100.0, 100.0), GranvilleSignal::Consolidation);
    }

    #[test]
    fn granville_signal_sides() {
        assert!(GranvilleSignal::Breakout.is_buy());
        assert!(GranvilleSignal::Resistance.is_sell());
        assert!(!GranvilleSignal::Consolidation.is_buy());
    }

    #[test]
    fn granville_latest_needs_defined_ma() {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let series = PriceSeries::from_closes(start, &[10.0, 11.0]).unwrap();
        assert!(granville_latest(&series, 5, 5).is_none());

        let closes: Vec<f64> = (0..30).map(|i| 100.0 + i as f64).collect();
        let series = PriceSeries::from_closes(start, &closes).unwrap();
        // Steady climb: close sits ~3.6% above a rising MA, no open cross.
        assert_eq!(
            granville_latest(&series, 10, 5),
            Some(GranvilleSignal::Consolidation)
        );
    }
}
