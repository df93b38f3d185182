//! CLI definition and dispatch.
//!
//! Stage messages go to stderr; results go to stdout as text or, with
//! `--json`, as serialized records.

use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::adapters::csv_adapter::CsvPriceSource;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::backtest::{BacktestResult, compare_strategies, try_run_strategy};
use crate::domain::config::EngineConfig;
use crate::domain::config_validation::validate_engine_config;
use crate::domain::deduction::forecast_with_drift;
use crate::domain::error::QuantError;
use crate::domain::geometry::{GeometryVector, compute_geometry};
use crate::domain::indicator::trend::ma_snapshot;
use crate::domain::ohlcv::PriceSeries;
use crate::domain::rating::{Rating, rate};
use crate::domain::scorecard::compute_scorecard;
use crate::domain::strategy::StrategyCatalog;
use crate::domain::universe::{parse_symbols, scan_universe};
use crate::domain::wave::{WavePoint, project_waves};
use crate::domain::zigzag::{Pivot, detect_pivots};
use crate::ports::data_port::PriceSource;

/// Bars fed to the zigzag when projecting waves.
pub const DEFAULT_WAVE_TAIL: usize = 300;

#[derive(Parser, Debug)]
#[command(
    name = "cbquant",
    about = "Signal, rating and backtest engine for convertible bonds and equities"
)]
pub struct Cli {
    /// Directory holding <SYMBOL>.csv price files
    #[arg(long, global = true, default_value = "data")]
    pub data: PathBuf,
    /// INI file overriding engine defaults
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
    /// Emit JSON instead of text
    #[arg(long, global = true)]
    pub json: bool,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Backtest one strategy on one symbol
    Backtest {
        #[arg(short, long)]
        symbol: String,
        #[arg(long, default_value = "price-above-20")]
        strategy: String,
    },
    /// Backtest every catalog strategy on one symbol
    Compare {
        #[arg(short, long)]
        symbol: String,
    },
    /// Rate and backtest many symbols in parallel
    Scan {
        /// Comma-separated symbols; defaults to every CSV in the data directory
        #[arg(long)]
        symbols: Option<String>,
        #[arg(long, default_value = "price-above-20")]
        strategy: String,
    },
    /// Latest value, bias and slope of each configured moving average
    Averages {
        #[arg(short, long)]
        symbol: String,
    },
    /// Multi-horizon trend geometry and rating
    Geometry {
        #[arg(short, long)]
        symbol: String,
    },
    /// Zigzag pivots and the projected wave continuation
    Waves {
        #[arg(short, long)]
        symbol: String,
        #[arg(long, default_value_t = DEFAULT_WAVE_TAIL)]
        tail: usize,
    },
    /// Moving-average deduction forecast
    Deduction {
        #[arg(short, long)]
        symbol: String,
        #[arg(long)]
        days: Option<usize>,
        /// Daily drift of the simulated path, as a fraction
        #[arg(long, allow_hyphen_values = true)]
        drift: Option<f64>,
    },
    /// G-Score checklist with squeeze and Granville readings
    Scorecard {
        #[arg(short, long)]
        symbol: String,
    },
    /// List the strategy catalog
    Strategies,
}

pub fn run(cli: Cli) -> ExitCode {
    let config = match load_engine_config(cli.config.as_deref()) {
        Ok(c) => c,
        Err(e) => return fail(&e),
    };
    let source = CsvPriceSource::new(cli.data.clone());
    let out = Output { json: cli.json };

    let result = match cli.command {
        Command::Backtest { symbol, strategy } => {
            run_backtest(&source, &config, &symbol, &strategy, out)
        }
        Command::Compare { symbol } => run_compare(&source, &config, &symbol, out),
        Command::Scan { symbols, strategy } => {
            run_scan(&source, &config, symbols.as_deref(), &strategy, out)
        }
        Command::Averages { symbol } => run_averages(&source, &config, &symbol, out),
        Command::Geometry { symbol } => run_geometry(&source, &config, &symbol, out),
        Command::Waves { symbol, tail } => run_waves(&source, &config, &symbol, tail, out),
        Command::Deduction { symbol, days, drift } => {
            run_deduction(&source, &config, &symbol, days, drift, out)
        }
        Command::Scorecard { symbol } => run_scorecard(&source, &symbol, out),
        Command::Strategies => run_strategies(out),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => fail(&e),
    }
}

fn fail(err: &QuantError) -> ExitCode {
    eprintln!("error: {err}");
    err.into()
}

/// Defaults, overlaid with the INI file at `path` when given.
pub fn load_engine_config(path: Option<&Path>) -> Result<EngineConfig, QuantError> {
    match path {
        Some(p) => {
            eprintln!("Loading config from {}", p.display());
            EngineConfig::from_port(&FileConfigAdapter::from_file(p)?)
        }
        None => Ok(EngineConfig::default()),
    }
}

#[derive(Debug, Clone, Copy)]
struct Output {
    json: bool,
}

impl Output {
    /// Print `value` as JSON, or the text rendering otherwise.
    fn emit<T: Serialize>(&self, value: &T, text: impl FnOnce() -> String) -> Result<(), QuantError> {
        if self.json {
            let rendered = serde_json::to_string_pretty(value).map_err(std::io::Error::other)?;
            println!("{rendered}");
        } else {
            print!("{}", text());
        }
        Ok(())
    }
}

fn load_series(source: &dyn PriceSource, symbol: &str) -> Result<PriceSeries, QuantError> {
    eprintln!("Loading {symbol}");
    let series = source.fetch_prices(symbol)?;
    if series.is_empty() {
        return Err(QuantError::insufficient(symbol, 0, 1));
    }
    eprintln!("  {}: {} bars", symbol, series.len());
    Ok(series)
}

fn pct(v: f64) -> String {
    format!("{:.2}%", v * 100.0)
}

fn format_backtest(title: &str, r: &BacktestResult) -> String {
    let mut s = format!("{title}\n");
    s += &format!("  Latest price:      {:.2} ({:?})\n", r.latest_price, r.latest_signal);
    s += &format!("  Final equity:      {:.0}\n", r.final_equity);
    s += &format!("  Total return:      {}\n", pct(r.total_return));
    s += &format!("  CAGR:              {}\n", pct(r.cagr));
    s += &format!("  Sharpe:            {:.2}\n", r.sharpe_ratio);
    s += &format!("  Sortino:           {:.2}\n", r.sortino_ratio);
    s += &format!(
        "  Max drawdown:      {} over {} bars\n",
        pct(r.max_drawdown),
        r.max_drawdown_duration
    );
    s += &format!("  Trade bars:        {}\n", r.trade_bars);
    s += &format!("  Win rate:          {}\n", pct(r.win_rate));
    s += &format!("  Profit factor:     {:.2}\n", r.profit_factor);
    s += &format!(
        "  Kelly / half:      {} / {}\n",
        pct(r.kelly_fraction),
        pct(r.half_kelly)
    );
    s += &format!("  10y projection:    {:.0}\n", r.projected_capital(10.0));
    s
}

fn run_backtest(
    source: &dyn PriceSource,
    config: &EngineConfig,
    symbol: &str,
    strategy_key: &str,
    out: Output,
) -> Result<(), QuantError> {
    let catalog = StrategyCatalog::default();
    let strategy = catalog.get(strategy_key)?;
    let series = load_series(source, symbol)?;
    eprintln!("Running {}", strategy);
    let result = try_run_strategy(&series, strategy, &config.backtest)?;
    out.emit(&result, || format_backtest(&format!("{symbol}: {}", strategy.name), &result))
}

fn run_compare(
    source: &dyn PriceSource,
    config: &EngineConfig,
    symbol: &str,
    out: Output,
) -> Result<(), QuantError> {
    let series = load_series(source, symbol)?;
    let catalog = StrategyCatalog::default();
    eprintln!("Comparing {} strategies", catalog.len());
    let reports = compare_strategies(&series, &catalog, &config.backtest);

    out.emit(&reports, || {
        let mut s = format!(
            "{:<22} {:>9} {:>7} {:>9} {:>7} {:>14}\n",
            "strategy", "CAGR", "Sharpe", "MaxDD", "Kelly", "10y capital"
        );
        for report in &reports {
            match &report.result {
                Some(r) => {
                    s += &format!(
                        "{:<22} {:>9} {:>7.2} {:>9} {:>7} {:>14.0}\n",
                        report.key,
                        pct(r.cagr),
                        r.sharpe_ratio,
                        pct(r.max_drawdown),
                        pct(r.kelly_fraction),
                        r.projected_capital(10.0)
                    );
                }
                None => s += &format!("{:<22} insufficient data\n", report.key),
            }
        }
        s
    })
}

fn run_scan(
    source: &dyn PriceSource,
    config: &EngineConfig,
    symbols: Option<&str>,
    strategy_key: &str,
    out: Output,
) -> Result<(), QuantError> {
    let catalog = StrategyCatalog::default();
    let strategy = catalog.get(strategy_key)?;
    let symbols = match symbols {
        Some(list) => parse_symbols(list).map_err(|e| QuantError::ConfigInvalid {
            section: "cli".to_string(),
            key: "symbols".to_string(),
            reason: e.to_string(),
        })?,
        None => source.list_symbols()?,
    };
    eprintln!("Scanning {} symbols with {}", symbols.len(), strategy);

    let report = scan_universe(source, &symbols, strategy, config);
    if !report.skipped.is_empty() {
        eprintln!(
            "Scanned {} of {} symbols",
            report.rows.len(),
            report.rows.len() + report.skipped.len()
        );
    }

    out.emit(&report, || {
        let mut s = format!(
            "{:<10} {:>6} {:>10} {:<12} {:>5} {:>9} {:>7}\n",
            "symbol", "bars", "price", "rating", "G", "CAGR", "Kelly"
        );
        for row in &report.rows {
            s += &format!(
                "{:<10} {:>6} {:>10.2} {:<12} {:>5} {:>9} {:>7}\n",
                row.symbol,
                row.bars,
                row.latest_price,
                row.rating.code,
                row.g_score.map_or("-".to_string(), |g| g.to_string()),
                row.cagr.map_or("-".to_string(), pct),
                row.kelly_fraction.map_or("-".to_string(), pct),
            );
        }
        for skipped in &report.skipped {
            s += &format!("{:<10} skipped: {}\n", skipped.symbol, skipped.reason);
        }
        s
    })
}

fn run_averages(
    source: &dyn PriceSource,
    config: &EngineConfig,
    symbol: &str,
    out: Output,
) -> Result<(), QuantError> {
    let series = load_series(source, symbol)?;
    let readings = ma_snapshot(&series, &config.ma_windows);
    let fmt = |v: Option<f64>| v.map_or("-".to_string(), |v| format!("{v:.2}"));

    out.emit(&readings, || {
        let mut s = format!("{:<6} {:>10} {:>9} {:>9}\n", "MA", "value", "bias %", "slope");
        for r in &readings {
            s += &format!(
                "{:<6} {:>10} {:>9} {:>9}\n",
                r.window,
                fmt(r.value),
                fmt(r.bias_pct),
                fmt(r.slope)
            );
        }
        s
    })
}

#[derive(Serialize)]
struct GeometryReport<'a> {
    symbol: &'a str,
    geometry: GeometryVector,
    rating: Rating,
}

fn run_geometry(
    source: &dyn PriceSource,
    config: &EngineConfig,
    symbol: &str,
    out: Output,
) -> Result<(), QuantError> {
    let series = load_series(source, symbol)?;
    let geometry = compute_geometry(&series, &config.horizons, config.monthly_geometry);
    let rating = rate(&geometry);
    let report = GeometryReport {
        symbol,
        geometry,
        rating,
    };

    out.emit(&report, || {
        let mut s = format!("{symbol}: {} ({})\n", report.rating.tier, report.rating.description);
        s += &format!("{:<5} {:>6} {:>9} {:>8}\n", "span", "bars", "angle", "r2");
        for f in &report.geometry.fits {
            s += &format!(
                "{:<5} {:>6} {:>9.2} {:>8.4}\n",
                f.horizon, f.bars, f.fit.angle, f.fit.r_squared
            );
        }
        s += &format!("acceleration {:.2}\n", report.geometry.acceleration);
        s += &format!("reversal signal {}\n", report.geometry.reversal_signal);
        s
    })
}

#[derive(Serialize)]
struct WaveReport {
    pivots: Vec<Pivot>,
    projection: Vec<WavePoint>,
}

fn run_waves(
    source: &dyn PriceSource,
    config: &EngineConfig,
    symbol: &str,
    tail: usize,
    out: Output,
) -> Result<(), QuantError> {
    let series = load_series(source, symbol)?;
    let recent = PriceSeries::new(series.tail(tail).to_vec())?;
    let pivots = detect_pivots(&recent, config.zigzag_deviation);
    let projection = project_waves(&pivots);
    let report = WaveReport { pivots, projection };

    out.emit(&report, || {
        let mut s = format!("{symbol}: {} pivots\n", report.pivots.len());
        for p in &report.pivots {
            s += &format!("  {} {:>10.2} {:?}\n", p.date, p.price, p.kind);
        }
        s += "projection\n";
        for w in &report.projection {
            s += &format!("  {} {:>10.2} {}\n", w.date, w.price, w.label);
        }
        s
    })
}

fn run_deduction(
    source: &dyn PriceSource,
    config: &EngineConfig,
    symbol: &str,
    days: Option<usize>,
    drift: Option<f64>,
    out: Output,
) -> Result<(), QuantError> {
    let mut settings = config.clone();
    if let Some(days) = days {
        settings.deduction.days = days;
    }
    if let Some(drift) = drift {
        settings.deduction.drift = drift;
    }
    validate_engine_config(&settings)?;

    let d = &settings.deduction;
    let series = load_series(source, symbol)?;
    let forecast = forecast_with_drift(&series, d.drift, d.days, &d.windows)
        .ok_or_else(|| QuantError::insufficient(symbol, 0, 1))?;

    out.emit(&forecast, || {
        let mut s = format!(
            "{symbol}: last close {:.2} on {}, volatility {:.2}%\n",
            forecast.last_close, forecast.last_date, forecast.volatility_pct
        );
        for m in &forecast.current_ma {
            let bias = forecast
                .bias(m.window)
                .map_or("-".to_string(), |b| format!("{b:?}"));
            s += &format!(
                "  MA{}: {} ({})\n",
                m.window,
                m.value.map_or("-".to_string(), |v| format!("{v:.2}")),
                bias
            );
        }
        for row in &forecast.rows {
            s += &format!("  {} {:>10.2}", row.date, row.simulated_price);
            for w in &row.windows {
                s += &format!(
                    "  MA{} {:>10} ded {:>10}",
                    w.window,
                    w.projected_ma.map_or("-".to_string(), |v| format!("{v:.2}")),
                    w.deduction_value.map_or("-".to_string(), |v| format!("{v:.2}")),
                );
            }
            s += "\n";
        }
        s
    })
}

fn run_scorecard(source: &dyn PriceSource, symbol: &str, out: Output) -> Result<(), QuantError> {
    let series = load_series(source, symbol)?;
    let card = compute_scorecard(&series).ok_or_else(|| QuantError::insufficient(symbol, 0, 1))?;

    out.emit(&card, || {
        let mut s = format!("{symbol}: G-Score {} ({:?})\n", card.score, card.status);
        for f in &card.factors {
            let mark = if f.awarded { "+" } else { " " };
            s += &format!("  [{mark}] {:>2}  {}\n", f.points, f.name);
        }
        if let Some(a) = card.alignment {
            s += &format!("  alignment: {a:?}\n");
        }
        if let Some(g) = card.granville {
            s += &format!("  granville: {g}\n");
        }
        if let Some(p) = card.persistence {
            let side = if p.bullish { "bullish" } else { "bearish" };
            s += &format!("  {side} for {} bars\n", p.bars);
        }
        s
    })
}

fn run_strategies(out: Output) -> Result<(), QuantError> {
    let catalog = StrategyCatalog::default();
    let strategies: Vec<_> = catalog.iter().collect();
    out.emit(&strategies, || {
        strategies
            .iter()
            .map(|s| format!("{:<22} {}\n", s.key, s.name))
            .collect()
    })
}
