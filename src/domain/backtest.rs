//! Vectorized backtest engine.
//!
//! A signal series is lagged one bar before it earns returns: the position
//! held over bar `t` is the signal computed at bar `t - 1`. Returns compound
//! into an equity curve seeded at the initial capital. Failures surface as a
//! sentinel `None` from [`run_backtest`] so batch callers can skip them;
//! [`try_run_backtest`] keeps the reason.

use crate::domain::error::QuantError;
use crate::domain::indicator::pct_change;
use crate::domain::metrics::{
    self, TradeBarStats, cagr, drawdown_series, max_drawdown, max_drawdown_duration,
};
use crate::domain::ohlcv::PriceSeries;
use crate::domain::strategy::{Signal, SignalRule, StrategyCatalog};
use chrono::NaiveDate;
use serde::Serialize;

pub const DEFAULT_INITIAL_CAPITAL: f64 = 1_000_000.0;
pub const DEFAULT_RISK_FREE_RATE: f64 = 0.02;
/// In-position bars needed before win rate and Kelly are reported.
pub const DEFAULT_MIN_TRADE_BARS: usize = 10;
/// A return series needs at least one bar-over-bar change.
pub const MIN_BACKTEST_BARS: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BacktestConfig {
    pub initial_capital: f64,
    pub risk_free_rate: f64,
    pub min_trade_bars: usize,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        BacktestConfig {
            initial_capital: DEFAULT_INITIAL_CAPITAL,
            risk_free_rate: DEFAULT_RISK_FREE_RATE,
            min_trade_bars: DEFAULT_MIN_TRADE_BARS,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EquityPoint {
    pub date: NaiveDate,
    pub equity: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DrawdownPoint {
    pub date: NaiveDate,
    pub drawdown: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BacktestResult {
    pub initial_capital: f64,
    pub final_equity: f64,
    pub total_return: f64,
    pub num_years: f64,
    pub cagr: f64,
    pub sharpe_ratio: f64,
    pub sortino_ratio: f64,
    /// Deepest drawdown, <= 0.
    pub max_drawdown: f64,
    /// Longest stretch under a prior peak, in bars.
    pub max_drawdown_duration: usize,
    pub trade_bars: usize,
    pub win_rate: f64,
    pub avg_win: f64,
    pub avg_loss: f64,
    pub profit_factor: f64,
    pub kelly_fraction: f64,
    pub half_kelly: f64,
    pub latest_price: f64,
    /// Signal on the last bar, the position for the next one.
    pub latest_signal: Signal,
    pub equity_curve: Vec<EquityPoint>,
    pub drawdown_series: Vec<DrawdownPoint>,
    /// Realized return per bar; 0 on the first bar.
    pub returns: Vec<f64>,
    /// Exposure held over each bar (the lagged signal).
    pub positions: Vec<f64>,
}

impl BacktestResult {
    /// Capital after compounding at the CAGR for `years`.
    pub fn projected_capital(&self, years: f64) -> f64 {
        self.initial_capital * (1.0 + self.cagr).powf(years)
    }
}

/// Run `signals` against `series`, reporting why when no result exists.
pub fn try_run_backtest(
    series: &PriceSeries,
    signals: &[Signal],
    config: &BacktestConfig,
) -> Result<BacktestResult, QuantError> {
    let bars = series.bars();
    if bars.len() < MIN_BACKTEST_BARS {
        return Err(QuantError::insufficient("backtest", bars.len(), MIN_BACKTEST_BARS));
    }
    if signals.len() != bars.len() {
        return Err(QuantError::malformed(
            signals.len().min(bars.len()),
            format!("{} signals for {} bars", signals.len(), bars.len()),
        ));
    }
    if !(config.initial_capital > 0.0 && config.initial_capital.is_finite()) {
        return Err(QuantError::malformed(0, "initial capital must be positive"));
    }

    let closes = series.closes();
    let changes = pct_change(&closes);

    let mut positions = Vec::with_capacity(bars.len());
    let mut returns = Vec::with_capacity(bars.len());
    positions.push(0.0);
    returns.push(0.0);
    for t in 1..bars.len() {
        let exposure = signals[t - 1].exposure();
        let change = if changes[t].is_finite() { changes[t] } else { 0.0 };
        positions.push(exposure);
        returns.push(exposure * change);
    }

    let mut equity = Vec::with_capacity(bars.len());
    let mut value = config.initial_capital;
    // A wiped-out account stays at zero; it cannot compound below it.
    for r in &returns {
        value = (value * (1.0 + r)).max(0.0);
        equity.push(value);
    }

    let drawdowns = drawdown_series(&equity);
    let final_equity = equity.last().copied().unwrap_or(config.initial_capital);
    let growth = final_equity / config.initial_capital;

    let held: Vec<f64> = returns
        .iter()
        .zip(&positions)
        .skip(1)
        .filter(|(_, p)| **p != 0.0)
        .map(|(r, _)| *r)
        .collect();
    let stats = TradeBarStats::compute(&held, config.min_trade_bars);

    let sample = &returns[1..];
    let latest_price = closes[closes.len() - 1];

    Ok(BacktestResult {
        initial_capital: config.initial_capital,
        final_equity,
        total_return: growth - 1.0,
        num_years: metrics::num_years(bars.len()),
        cagr: cagr(growth, bars.len()),
        sharpe_ratio: metrics::sharpe_ratio(sample, config.risk_free_rate),
        sortino_ratio: metrics::sortino_ratio(sample, config.risk_free_rate),
        max_drawdown: max_drawdown(&drawdowns),
        max_drawdown_duration: max_drawdown_duration(&equity),
        trade_bars: stats.trade_bars,
        win_rate: stats.win_rate,
        avg_win: stats.avg_win,
        avg_loss: stats.avg_loss,
        profit_factor: stats.profit_factor,
        kelly_fraction: stats.kelly_fraction,
        half_kelly: stats.half_kelly,
        latest_price,
        latest_signal: signals[signals.len() - 1],
        equity_curve: bars
            .iter()
            .zip(&equity)
            .map(|(b, &equity)| EquityPoint { date: b.date, equity })
            .collect(),
        drawdown_series: bars
            .iter()
            .zip(&drawdowns)
            .map(|(b, &drawdown)| DrawdownPoint { date: b.date, drawdown })
            .collect(),
        returns,
        positions,
    })
}

/// Sentinel form of [`try_run_backtest`]: `None` when no result exists.
pub fn run_backtest(
    series: &PriceSeries,
    signals: &[Signal],
    config: &BacktestConfig,
) -> Option<BacktestResult> {
    try_run_backtest(series, signals, config)
        .inspect_err(|e| tracing::debug!(error = %e, "backtest produced no result"))
        .ok()
}

/// Evaluate `rule` over `series` and backtest its signals.
pub fn try_run_strategy(
    series: &PriceSeries,
    rule: &dyn SignalRule,
    config: &BacktestConfig,
) -> Result<BacktestResult, QuantError> {
    let required = rule.required_bars().max(MIN_BACKTEST_BARS);
    if series.len() < required {
        return Err(QuantError::insufficient(rule.name(), series.len(), required));
    }
    let signals = rule.signals(series);
    try_run_backtest(series, &signals, config)
}

pub fn run_strategy(
    series: &PriceSeries,
    rule: &dyn SignalRule,
    config: &BacktestConfig,
) -> Option<BacktestResult> {
    try_run_strategy(series, rule, config)
        .inspect_err(|e| tracing::debug!(strategy = rule.name(), error = %e, "strategy skipped"))
        .ok()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StrategyReport {
    pub key: String,
    pub name: String,
    pub result: Option<BacktestResult>,
}

/// Backtest every catalog strategy over the same series. Strategies lacking
/// history report `None` without affecting the others.
pub fn compare_strategies(
    series: &PriceSeries,
    catalog: &StrategyCatalog,
    config: &BacktestConfig,
) -> Vec<StrategyReport> {
    catalog
        .iter()
        .map(|strategy| StrategyReport {
            key: strategy.key.clone(),
            name: strategy.name.clone(),
            result: run_strategy(series, strategy, config),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::strategy::Strategy;
    use approx::assert_relative_eq;

    fn series(closes: &[f64]) -> PriceSeries {
        PriceSeries::from_closes(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(), closes).unwrap()
    }

    #[test]
    fn short_through_a_doubling_is_wiped_out_not_negative() {
        // +150% then +20% against a short position.
        let s = series(&[10.0, 25.0, 30.0, 15.0]);
        let r = try_run_backtest(&s, &[Signal::Short; 4], &BacktestConfig::default()).unwrap();
        let equity: Vec<f64> = r.equity_curve.iter().map(|p| p.equity).collect();
        assert_eq!(equity, vec![DEFAULT_INITIAL_CAPITAL, 0.0, 0.0, 0.0]);
        assert_eq!(r.final_equity, 0.0);
        assert_eq!(r.max_drawdown, -1.0);
        assert!(r.drawdown_series.iter().all(|d| d.drawdown >= -1.0));
        assert_eq!(r.cagr, -1.0);
    }

    #[test]
    fn equity_starts_at_capital() {
        let s = series(&[10.0, 11.0, 12.0]);
        let r = try_run_backtest(&s, &[Signal::Long; 3], &BacktestConfig::default()).unwrap();
        assert_eq!(r.equity_curve[0].equity, DEFAULT_INITIAL_CAPITAL);
        assert_relative_eq!(r.final_equity, 1_200_000.0, epsilon = 1e-6);
        assert_relative_eq!(r.total_return, 0.2, epsilon = 1e-12);
    }

    #[test]
    fn signal_is_lagged_one_bar() {
        let s = series(&[10.0, 20.0, 10.0]);
        let signals = [Signal::Flat, Signal::Long, Signal::Flat];
        let r = try_run_backtest(&s, &signals, &BacktestConfig::default()).unwrap();
        assert_eq!(r.positions, vec![0.0, 0.0, 1.0]);
        // The 20 -> 10 drop is taken, the 10 -> 20 rise is not.
        assert_relative_eq!(r.returns[2], -0.5, epsilon = 1e-12);
        assert_relative_eq!(r.final_equity, 500_000.0, epsilon = 1e-6);
        assert_relative_eq!(r.max_drawdown, -0.5, epsilon = 1e-12);
    }

    #[test]
    fn short_exposure_profits_from_declines() {
        let s = series(&[10.0, 8.0]);
        let r = try_run_backtest(&s, &[Signal::Short, Signal::Short], &BacktestConfig::default())
            .unwrap();
        assert_relative_eq!(r.returns[1], 0.2, epsilon = 1e-12);
    }

    #[test]
    fn zero_base_change_is_neutralized() {
        let s = series(&[0.0, 5.0, 10.0]);
        let r = try_run_backtest(&s, &[Signal::Long; 3], &BacktestConfig::default()).unwrap();
        assert_eq!(r.returns[1], 0.0);
        assert_relative_eq!(r.returns[2], 1.0, epsilon = 1e-12);
        assert!(r.equity_curve.iter().all(|p| p.equity.is_finite()));
    }

    #[test]
    fn too_short_is_insufficient() {
        let s = series(&[10.0]);
        let err = try_run_backtest(&s, &[Signal::Long], &BacktestConfig::default()).unwrap_err();
        assert!(matches!(err, QuantError::InsufficientData { .. }));
        assert!(run_backtest(&s, &[Signal::Long], &BacktestConfig::default()).is_none());
    }

    #[test]
    fn misaligned_signals_are_malformed() {
        let s = series(&[10.0, 11.0, 12.0]);
        let err = try_run_backtest(&s, &[Signal::Long], &BacktestConfig::default()).unwrap_err();
        assert!(matches!(err, QuantError::MalformedInput { .. }));
    }

    #[test]
    fn strategy_needs_its_window() {
        let s = series(&[10.0; 20]);
        let err = try_run_strategy(&s, &Strategy::price_above(20), &BacktestConfig::default())
            .unwrap_err();
        assert!(matches!(
            err,
            QuantError::InsufficientData { bars: 20, required: 21, .. }
        ));
    }

    #[test]
    fn kelly_zero_below_min_trade_bars() {
        let closes: Vec<f64> = (0..8).map(|i| 100.0 + i as f64).collect();
        let r = try_run_backtest(&series(&closes), &[Signal::Long; 8], &BacktestConfig::default())
            .unwrap();
        assert_eq!(r.trade_bars, 7);
        assert_eq!(r.kelly_fraction, 0.0);
        assert_eq!(r.win_rate, 0.0);
    }

    #[test]
    fn projected_capital_compounds_cagr() {
        let closes: Vec<f64> = (0..253).map(|i| 100.0 * 2f64.powf(i as f64 / 252.0)).collect();
        let config = BacktestConfig::default();
        let r = try_run_backtest(&series(&closes), &[Signal::Long; 253], &config).unwrap();
        assert!(r.cagr > 0.9);
        assert_relative_eq!(
            r.projected_capital(2.0),
            config.initial_capital * (1.0 + r.cagr).powi(2),
            epsilon = 1e-6
        );
    }

    #[test]
    fn compare_keeps_going_past_short_history() {
        let closes: Vec<f64> = (0..100).map(|i| 100.0 + i as f64).collect();
        let reports =
            compare_strategies(&series(&closes), &StrategyCatalog::default(), &BacktestConfig::default());
        assert_eq!(reports.len(), 15);
        let ok = reports.iter().filter(|r| r.result.is_some()).count();
        // 20/43/60/87 price rules, asymmetric, 20/60, 20/87, 43/87, 60/87, dual confirm.
        assert_eq!(ok, 10);
        let core = reports.iter().find(|r| r.key == "core-87-284").unwrap();
        assert!(core.result.is_none());
    }
}
