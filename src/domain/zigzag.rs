//! Zigzag pivot detection.
//!
//! An explicit three-state machine walks the closes. The anchor is the most
//! extreme close of the current leg; a retracement beyond `deviation` from it
//! confirms the anchor as a pivot and flips the trend. The first bar is
//! always a `Start` pivot and the last bar a synthetic `Current` pivot, so
//! High and Low pivots strictly alternate in between.

use crate::domain::ohlcv::PriceSeries;
use chrono::NaiveDate;
use serde::Serialize;

pub const DEFAULT_DEVIATION: f64 = 0.03;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PivotKind {
    Start,
    High,
    Low,
    Current,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Pivot {
    pub index: usize,
    pub date: NaiveDate,
    pub price: f64,
    pub kind: PivotKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ZigzagState {
    Flat,
    Uptrend,
    Downtrend,
}

/// Outcome of feeding one close to the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Nothing changes.
    Hold,
    /// Move the anchor to this bar, keeping the state.
    Extend,
    /// Leave `Flat` for a trend; the anchor moves to this bar.
    Enter(ZigzagState),
    /// Confirm the anchor as a pivot of this kind and reverse the trend.
    Reverse(PivotKind),
}

/// Pure transition function over (state, anchor price, close).
pub fn transition(state: ZigzagState, anchor: f64, close: f64, deviation: f64) -> Transition {
    // Any move off a zero anchor exceeds every deviation.
    let change = if anchor != 0.0 {
        (close - anchor) / anchor.abs()
    } else if close != anchor {
        (close - anchor).signum() * f64::INFINITY
    } else {
        0.0
    };
    match state {
        ZigzagState::Flat if change > deviation => Transition::Enter(ZigzagState::Uptrend),
        ZigzagState::Flat if change < -deviation => Transition::Enter(ZigzagState::Downtrend),
        ZigzagState::Flat => Transition::Hold,
        ZigzagState::Uptrend if close > anchor => Transition::Extend,
        ZigzagState::Uptrend if change < -deviation => Transition::Reverse(PivotKind::High),
        ZigzagState::Downtrend if close < anchor => Transition::Extend,
        ZigzagState::Downtrend if change > deviation => Transition::Reverse(PivotKind::Low),
        ZigzagState::Uptrend | ZigzagState::Downtrend => Transition::Hold,
    }
}

/// Incremental zigzag tracker.
#[derive(Debug, Clone)]
pub struct Zigzag {
    deviation: f64,
    state: ZigzagState,
    anchor_index: usize,
    anchor_date: NaiveDate,
    anchor_price: f64,
}

impl Zigzag {
    /// Start tracking from the first bar.
    pub fn new(deviation: f64, date: NaiveDate, close: f64) -> Self {
        Self {
            deviation,
            state: ZigzagState::Flat,
            anchor_index: 0,
            anchor_date: date,
            anchor_price: close,
        }
    }

    pub fn state(&self) -> ZigzagState {
        self.state
    }

    /// Feed bar `index`; returns a pivot when a reversal confirms one.
    pub fn push(&mut self, index: usize, date: NaiveDate, close: f64) -> Option<Pivot> {
        let step = transition(self.state, self.anchor_price, close, self.deviation);
        let pivot = match step {
            Transition::Hold => return None,
            Transition::Extend => None,
            Transition::Enter(next) => {
                self.state = next;
                None
            }
            Transition::Reverse(kind) => {
                self.state = match kind {
                    PivotKind::High => ZigzagState::Downtrend,
                    _ => ZigzagState::Uptrend,
                };
                Some(Pivot {
                    index: self.anchor_index,
                    date: self.anchor_date,
                    price: self.anchor_price,
                    kind,
                })
            }
        };
        self.anchor_index = index;
        self.anchor_date = date;
        self.anchor_price = close;
        pivot
    }
}

/// Detect pivots over the closes of `series`. Empty input yields no pivots.
pub fn detect_pivots(series: &PriceSeries, deviation: f64) -> Vec<Pivot> {
    let bars = series.bars();
    let (Some(first), Some(last)) = (bars.first(), bars.last()) else {
        return Vec::new();
    };

    let mut pivots = vec![Pivot {
        index: 0,
        date: first.date,
        price: first.close,
        kind: PivotKind::Start,
    }];

    let mut tracker = Zigzag::new(deviation, first.date, first.close);
    for (i, bar) in bars.iter().enumerate().skip(1) {
        if let Some(pivot) = tracker.push(i, bar.date, bar.close) {
            pivots.push(pivot);
        }
    }

    pivots.push(Pivot {
        index: bars.len() - 1,
        date: last.date,
        price: last.close,
        kind: PivotKind::Current,
    });
    pivots
}

/// True when High/Low pivots strictly alternate, ignoring Start and Current.
pub fn alternates(pivots: &[Pivot]) -> bool {
    let turns: Vec<PivotKind> = pivots
        .iter()
        .map(|p| p.kind)
        .filter(|k| matches!(k, PivotKind::High | PivotKind::Low))
        .collect();
    turns.windows(2).all(|w| w[0] != w[1])
}
