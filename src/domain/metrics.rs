//! Performance statistics over an equity curve and its per-bar returns.

use super::indicator::stddev::sample_stddev;
use serde::Serialize;

pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;
/// Standard deviations at or below this count as zero variance.
const VARIANCE_EPSILON: f64 = 1e-12;

/// `equity / running_max(equity) - 1` per bar. Always <= 0.
pub fn drawdown_series(equity: &[f64]) -> Vec<f64> {
    let mut peak = f64::NEG_INFINITY;
    equity
        .iter()
        .map(|&e| {
            peak = peak.max(e);
            if peak > 0.0 { (e / peak - 1.0).min(0.0) } else { 0.0 }
        })
        .collect()
}

/// Deepest drawdown (<= 0), 0 for an empty series.
pub fn max_drawdown(drawdowns: &[f64]) -> f64 {
    drawdowns.iter().copied().fold(0.0, f64::min)
}

/// Longest run of consecutive bars spent below a prior equity peak.
pub fn max_drawdown_duration(equity: &[f64]) -> usize {
    let Some(&first) = equity.first() else {
        return 0;
    };
    let mut peak = first;
    let mut current = 0usize;
    let mut longest = 0usize;
    for &e in &equity[1..] {
        if e >= peak {
            peak = e;
            current = 0;
        } else {
            current += 1;
            longest = longest.max(current);
        }
    }
    longest
}

/// Years covered by `bars` trading bars.
pub fn num_years(bars: usize) -> f64 {
    bars as f64 / TRADING_DAYS_PER_YEAR
}

/// Compound annual growth from a final/initial equity ratio over `bars`.
/// A wiped-out account reports -1.
pub fn cagr(growth: f64, bars: usize) -> f64 {
    let years = num_years(bars);
    if years <= 0.0 || !growth.is_finite() {
        return 0.0;
    }
    if growth <= 0.0 {
        return -1.0;
    }
    growth.powf(1.0 / years) - 1.0
}

/// Annualized Sharpe: `(mean * 252 - rf) / (std * sqrt(252))` with sample
/// standard deviation. 0 when the returns have no variance.
pub fn sharpe_ratio(returns: &[f64], risk_free_rate: f64) -> f64 {
    if returns.len() < 2 {
        return 0.0;
    }
    let std = sample_stddev(returns);
    if std <= VARIANCE_EPSILON {
        return 0.0;
    }
    let mean = returns.iter().sum::<f64>() / returns.len() as f64;
    (mean * TRADING_DAYS_PER_YEAR - risk_free_rate) / (std * TRADING_DAYS_PER_YEAR.sqrt())
}

/// Sortino ratio: excess return over downside deviation below the daily
/// risk-free rate. 0 without downside.
pub fn sortino_ratio(returns: &[f64], risk_free_rate: f64) -> f64 {
    if returns.is_empty() {
        return 0.0;
    }
    let n = returns.len() as f64;
    let daily_rf = risk_free_rate / TRADING_DAYS_PER_YEAR;
    let mean = returns.iter().sum::<f64>() / n;

    let downside = returns
        .iter()
        .filter(|&&r| r < daily_rf)
        .map(|&r| (r - daily_rf).powi(2))
        .sum::<f64>()
        / n;
    let downside_dev = downside.sqrt();
    if downside_dev <= VARIANCE_EPSILON {
        return 0.0;
    }
    (mean - daily_rf) / downside_dev * TRADING_DAYS_PER_YEAR.sqrt()
}

/// Win/loss statistics over the bars held in a position.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct TradeBarStats {
    pub trade_bars: usize,
    pub win_rate: f64,
    pub avg_win: f64,
    /// Mean absolute losing return; 0 when no bar lost.
    pub avg_loss: f64,
    pub profit_factor: f64,
    pub kelly_fraction: f64,
    pub half_kelly: f64,
}

impl TradeBarStats {
    /// `returns` are the realized returns of in-position bars only. Fewer
    /// than `min_trade_bars` of them zero every ratio.
    pub fn compute(returns: &[f64], min_trade_bars: usize) -> Self {
        let trade_bars = returns.len();
        if trade_bars == 0 || trade_bars < min_trade_bars {
            return TradeBarStats {
                trade_bars,
                ..Default::default()
            };
        }

        let wins: Vec<f64> = returns.iter().copied().filter(|r| *r > 0.0).collect();
        let losses: Vec<f64> = returns.iter().copied().filter(|r| *r < 0.0).collect();

        let win_rate = wins.len() as f64 / trade_bars as f64;
        let avg_win = mean_or(&wins, 0.0);
        let avg_loss = mean_or(&losses, 0.0).abs();

        // A loss-free record measures payoff against a unit loss.
        let payoff_base = if losses.is_empty() { 1.0 } else { avg_loss };
        let profit_factor = if payoff_base > 0.0 { avg_win / payoff_base } else { 0.0 };

        let kelly_fraction = if profit_factor > 0.0 {
            (win_rate - (1.0 - win_rate) / profit_factor).max(0.0)
        } else {
            0.0
        };

        TradeBarStats {
            trade_bars,
            win_rate,
            avg_win,
            avg_loss,
            profit_factor,
            kelly_fraction,
            half_kelly: kelly_fraction / 2.0,
        }
    }
}

fn mean_or(values: &[f64], fallback: f64) -> f64 {
    if values.is_empty() {
        fallback
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}
