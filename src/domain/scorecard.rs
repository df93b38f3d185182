//! G-Score: a 0-100 trend checklist around the 87/284-bar averages, plus the
//! squeeze, Granville and persistence readings that accompany it.

use crate::domain::deduction::{DEFAULT_FORECAST_DAYS, forecast_with_drift};
use crate::domain::indicator::sma;
use crate::domain::indicator::trend::{
    DEFAULT_SLOPE_LAG, GranvilleSignal, TrendPersistence, bias_pct, granville_latest,
    trend_persistence,
};
use crate::domain::ohlcv::PriceSeries;
use serde::Serialize;

pub const FAST_WINDOW: usize = 87;
pub const SLOW_WINDOW: usize = 284;
pub const MOMENTUM_WINDOW: usize = 20;
/// MA spread (fraction of the slow MA) under which the averages are tangled.
pub const SQUEEZE_THRESHOLD: f64 = 0.015;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ScoreStatus {
    ClearSky,
    RangeBound,
    BearishPressure,
}

impl ScoreStatus {
    pub fn from_score(score: u32) -> Self {
        match score {
            80.. => ScoreStatus::ClearSky,
            50..80 => ScoreStatus::RangeBound,
            _ => ScoreStatus::BearishPressure,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MaAlignment {
    /// Fast and slow averages within the squeeze threshold.
    Squeeze,
    BullishExpansion,
    BearishStack,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ScoreFactor {
    pub name: &'static str,
    pub points: u32,
    pub awarded: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Scorecard {
    pub score: u32,
    pub status: ScoreStatus,
    pub factors: Vec<ScoreFactor>,
    pub close: f64,
    pub ma_fast: Option<f64>,
    pub ma_slow: Option<f64>,
    /// |fast - slow| / slow.
    pub ma_spread: Option<f64>,
    pub alignment: Option<MaAlignment>,
    pub bias_fast_pct: f64,
    pub bias_slow_pct: f64,
    pub granville: Option<GranvilleSignal>,
    pub persistence: Option<TrendPersistence>,
}

fn gt(a: f64, b: Option<f64>) -> bool {
    b.is_some_and(|b| a > b)
}

/// Score the last bar of `series`. `None` for an empty series; undefined
/// averages simply withhold their points.
pub fn compute_scorecard(series: &PriceSeries) -> Option<Scorecard> {
    let close = series.last()?.close;
    let closes = series.closes();

    let ma_fast = sma::latest(&closes, FAST_WINDOW);
    let ma_slow = sma::latest(&closes, SLOW_WINDOW);
    let momentum = sma::latest(&closes, MOMENTUM_WINDOW.min(closes.len()));
    let deduction_mean = forecast_with_drift(series, 0.0, DEFAULT_FORECAST_DAYS, &[FAST_WINDOW])
        .and_then(|f| f.mean_deduction(FAST_WINDOW, DEFAULT_FORECAST_DAYS));

    let factors = vec![
        ScoreFactor {
            name: "close above fast MA",
            points: 15,
            awarded: gt(close, ma_fast),
        },
        ScoreFactor {
            name: "close above slow MA",
            points: 15,
            awarded: gt(close, ma_slow),
        },
        ScoreFactor {
            name: "close above 20-bar mean",
            points: 20,
            awarded: gt(close, momentum),
        },
        ScoreFactor {
            name: "fast MA above slow MA",
            points: 30,
            awarded: ma_fast.is_some_and(|f| gt(f, ma_slow)),
        },
        ScoreFactor {
            name: "upcoming deductions below close",
            points: 20,
            awarded: deduction_mean.is_some_and(|d| d < close),
        },
    ];
    let score = factors.iter().filter(|f| f.awarded).map(|f| f.points).sum();

    let ma_spread = match (ma_fast, ma_slow) {
        (Some(fast), Some(slow)) if slow != 0.0 => Some((fast - slow).abs() / slow),
        _ => None,
    };
    let alignment = ma_spread.zip(ma_fast.zip(ma_slow)).map(|(spread, (fast, slow))| {
        if spread < SQUEEZE_THRESHOLD {
            MaAlignment::Squeeze
        } else if fast > slow {
            MaAlignment::BullishExpansion
        } else {
            MaAlignment::BearishStack
        }
    });

    let fast_series = sma::moving_average(&closes, FAST_WINDOW);
    let slow_series = sma::moving_average(&closes, SLOW_WINDOW);

    Some(Scorecard {
        score,
        status: ScoreStatus::from_score(score),
        factors,
        close,
        ma_fast,
        ma_slow,
        ma_spread,
        alignment,
        bias_fast_pct: ma_fast.map_or(0.0, |m| bias_pct(close, m)),
        bias_slow_pct: ma_slow.map_or(0.0, |m| bias_pct(close, m)),
        granville: granville_latest(series, FAST_WINDOW, DEFAULT_SLOPE_LAG),
        persistence: trend_persistence(&fast_series, &slow_series),
    })
}
