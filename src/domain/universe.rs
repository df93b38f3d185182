//! Symbol universes and batch scans.
//!
//! Parses symbol lists and evaluates every symbol independently, in
//! parallel. A failing symbol is logged and skipped; it never aborts the
//! rest of the batch.

use crate::domain::backtest::run_strategy;
use crate::domain::config::EngineConfig;
use crate::domain::error::QuantError;
use crate::domain::geometry::compute_geometry;
use crate::domain::ohlcv::PriceSeries;
use crate::domain::rating::{Rating, rate};
use crate::domain::scorecard::compute_scorecard;
use crate::domain::strategy::SignalRule;
use crate::ports::data_port::PriceSource;
use rayon::prelude::*;
use serde::Serialize;
use std::collections::HashSet;

#[derive(Debug, Clone, thiserror::Error)]
pub enum UniverseError {
    #[error("empty token in symbol list")]
    EmptyToken,

    #[error("duplicate symbol: {0}")]
    DuplicateSymbol(String),
}

pub fn parse_symbols(input: &str) -> Result<Vec<String>, UniverseError> {
    let mut symbols = Vec::new();
    let mut seen = HashSet::new();

    for token in input.split(',') {
        let trimmed = token.trim();
        if trimmed.is_empty() {
            return Err(UniverseError::EmptyToken);
        }
        let symbol = trimmed.to_uppercase();
        if !seen.insert(symbol.clone()) {
            return Err(UniverseError::DuplicateSymbol(symbol));
        }
        symbols.push(symbol);
    }

    Ok(symbols)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScanRow {
    pub symbol: String,
    pub bars: usize,
    pub latest_price: f64,
    pub rating: Rating,
    pub g_score: Option<u32>,
    pub cagr: Option<f64>,
    pub sharpe_ratio: Option<f64>,
    pub max_drawdown: Option<f64>,
    pub kelly_fraction: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedSymbol {
    pub symbol: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ScanReport {
    pub rows: Vec<ScanRow>,
    pub skipped: Vec<SkippedSymbol>,
}

/// Rating, G-Score and strategy backtest for one series.
pub fn evaluate_symbol(
    symbol: &str,
    series: &PriceSeries,
    rule: &dyn SignalRule,
    config: &EngineConfig,
) -> Result<ScanRow, QuantError> {
    let last = series
        .last()
        .ok_or_else(|| QuantError::insufficient(symbol, 0, 1))?;
    let geometry = compute_geometry(series, &config.horizons, config.monthly_geometry);
    let backtest = run_strategy(series, rule, &config.backtest);

    Ok(ScanRow {
        symbol: symbol.to_string(),
        bars: series.len(),
        latest_price: last.close,
        rating: rate(&geometry),
        g_score: compute_scorecard(series).map(|c| c.score),
        cagr: backtest.as_ref().map(|r| r.cagr),
        sharpe_ratio: backtest.as_ref().map(|r| r.sharpe_ratio),
        max_drawdown: backtest.as_ref().map(|r| r.max_drawdown),
        kelly_fraction: backtest.as_ref().map(|r| r.kelly_fraction),
    })
}

/// Evaluate every symbol in parallel, keeping input order.
pub fn scan_universe<R>(
    source: &dyn PriceSource,
    symbols: &[String],
    rule: &R,
    config: &EngineConfig,
) -> ScanReport
where
    R: SignalRule + Sync,
{
    let outcomes: Vec<(String, Result<ScanRow, QuantError>)> = symbols
        .par_iter()
        .map(|symbol| {
            let outcome = source
                .fetch_prices(symbol)
                .and_then(|series| evaluate_symbol(symbol, &series, rule, config));
            (symbol.clone(), outcome)
        })
        .collect();

    let mut report = ScanReport::default();
    for (symbol, outcome) in outcomes {
        match outcome {
            Ok(row) => report.rows.push(row),
            Err(e) => {
                if e.is_recoverable() {
                    tracing::debug!(%symbol, error = %e, "skipping symbol");
                } else {
                    tracing::warn!(%symbol, error = %e, "skipping symbol");
                }
                report.skipped.push(SkippedSymbol {
                    symbol,
                    reason: e.to_string(),
                });
            }
        }
    }
    report
}
