//! Price bar representation and series normalization.
//!
//! A [`PriceSeries`] is validated once at construction: closes must be
//! finite, every numeric field finite, and dates strictly increasing. The
//! rest of the engine trusts that contract and never re-checks it.

use crate::domain::error::QuantError;
use chrono::{Datelike, NaiveDate};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl PriceBar {
    /// Bar with every price set to `close` and zero volume.
    pub fn from_close(date: NaiveDate, close: f64) -> Self {
        Self {
            date,
            open: close,
            high: close,
            low: close,
            close,
            volume: 0.0,
        }
    }
}

/// A bar as supplied by a data collaborator. Only `close` is mandatory;
/// missing open/high/low fall back to close and missing volume to zero.
#[derive(Debug, Clone, PartialEq)]
pub struct RawBar {
    pub date: NaiveDate,
    pub open: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub close: f64,
    pub volume: Option<f64>,
}

impl RawBar {
    fn into_bar(self) -> PriceBar {
        let close = self.close;
        PriceBar {
            date: self.date,
            open: self.open.unwrap_or(close),
            high: self.high.unwrap_or(close),
            low: self.low.unwrap_or(close),
            close,
            volume: self.volume.unwrap_or(0.0),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PriceSeries {
    bars: Vec<PriceBar>,
}

impl PriceSeries {
    pub fn new(bars: Vec<PriceBar>) -> Result<Self, QuantError> {
        validate_bars(&bars)?;
        Ok(Self { bars })
    }

    /// Normalize collaborator rows, applying the degraded-mode defaults.
    pub fn from_raw(rows: Vec<RawBar>) -> Result<Self, QuantError> {
        Self::new(rows.into_iter().map(RawBar::into_bar).collect())
    }

    /// Close-only series on consecutive calendar days starting at `start`.
    pub fn from_closes(start: NaiveDate, closes: &[f64]) -> Result<Self, QuantError> {
        let bars = closes
            .iter()
            .enumerate()
            .map(|(i, &close)| PriceBar::from_close(start + chrono::Duration::days(i as i64), close))
            .collect();
        Self::new(bars)
    }

    pub fn bars(&self) -> &[PriceBar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn first(&self) -> Option<&PriceBar> {
        self.bars.first()
    }

    pub fn last(&self) -> Option<&PriceBar> {
        self.bars.last()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.bars.iter().map(|b| b.date).collect()
    }

    /// The last `n` bars, or the whole series when shorter.
    pub fn tail(&self, n: usize) -> &[PriceBar] {
        let start = self.bars.len().saturating_sub(n);
        &self.bars[start..]
    }

    /// Resample to calendar months: first open, max high, min low, last
    /// close, summed volume, dated at the month's last calendar day.
    pub fn to_monthly(&self) -> PriceSeries {
        let mut months: Vec<PriceBar> = Vec::new();
        let mut current: Option<(i32, u32)> = None;

        for bar in &self.bars {
            let key = (bar.date.year(), bar.date.month());
            match months.last_mut() {
                Some(month) if current == Some(key) => {
                    month.high = month.high.max(bar.high);
                    month.low = month.low.min(bar.low);
                    month.close = bar.close;
                    month.volume += bar.volume;
                }
                _ => {
                    current = Some(key);
                    months.push(PriceBar {
                        date: month_end(bar.date),
                        ..bar.clone()
                    });
                }
            }
        }

        // Month ends are strictly increasing because the input dates are.
        PriceSeries { bars: months }
    }
}

fn month_end(date: NaiveDate) -> NaiveDate {
    let (year, month) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };
    NaiveDate::from_ymd_opt(year, month, 1)
        .and_then(|d| d.pred_opt())
        .unwrap_or(date)
}

fn validate_bars(bars: &[PriceBar]) -> Result<(), QuantError> {
    for (i, bar) in bars.iter().enumerate() {
        if !bar.close.is_finite() {
            return Err(QuantError::malformed(i, "close is not a finite number"));
        }
        if ![bar.open, bar.high, bar.low, bar.volume]
            .iter()
            .all(|v| v.is_finite())
        {
            return Err(QuantError::malformed(i, "open/high/low/volume must be finite"));
        }
        if i > 0 && bar.date <= bars[i - 1].date {
            return Err(QuantError::malformed(
                i,
                format!(
                    "date {} does not follow {} (dates must be strictly increasing)",
                    bar.date,
                    bars[i - 1].date
                ),
            ));
        }
    }
    Ok(())
}
