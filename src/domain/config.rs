//! Engine configuration.
//!
//! Every parameter is an explicit value passed to the engine; nothing is
//! global. `EngineConfig::default()` carries the documented defaults and
//! [`EngineConfig::from_port`] overlays whatever an INI source provides.

use crate::domain::backtest::BacktestConfig;
use crate::domain::config_validation::validate_engine_config;
use crate::domain::deduction::{DEFAULT_DEDUCTION_WINDOWS, DEFAULT_FORECAST_DAYS};
use crate::domain::error::QuantError;
use crate::domain::geometry::DEFAULT_HORIZONS;
use crate::domain::zigzag::DEFAULT_DEVIATION;
use crate::ports::config_port::ConfigPort;
use serde::Serialize;

pub const DEFAULT_MA_WINDOWS: [usize; 5] = [20, 43, 60, 87, 284];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeductionConfig {
    pub days: usize,
    /// Daily drift of the simulated path, as a fraction.
    pub drift: f64,
    pub windows: Vec<usize>,
}

impl Default for DeductionConfig {
    fn default() -> Self {
        DeductionConfig {
            days: DEFAULT_FORECAST_DAYS,
            drift: 0.0,
            windows: DEFAULT_DEDUCTION_WINDOWS.to_vec(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EngineConfig {
    pub backtest: BacktestConfig,
    pub ma_windows: Vec<usize>,
    pub zigzag_deviation: f64,
    pub horizons: [usize; 7],
    /// Fit geometry on month-end closes.
    pub monthly_geometry: bool,
    pub deduction: DeductionConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            backtest: BacktestConfig::default(),
            ma_windows: DEFAULT_MA_WINDOWS.to_vec(),
            zigzag_deviation: DEFAULT_DEVIATION,
            horizons: DEFAULT_HORIZONS,
            monthly_geometry: true,
            deduction: DeductionConfig::default(),
        }
    }
}

fn list(
    port: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: Vec<usize>,
) -> Result<Vec<usize>, QuantError> {
    match port.get_usize_list(section, key) {
        None => Ok(default),
        Some(Ok(values)) => Ok(values),
        Some(Err(token)) => Err(QuantError::ConfigInvalid {
            section: section.to_string(),
            key: key.to_string(),
            reason: format!("'{}' is not a non-negative integer", token),
        }),
    }
}

fn count(port: &dyn ConfigPort, section: &str, key: &str, default: usize) -> Result<usize, QuantError> {
    let value = port.get_int(section, key, default as i64);
    usize::try_from(value).map_err(|_| QuantError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: format!("{} must be non-negative", key),
    })
}

impl EngineConfig {
    /// Overlay `port` on the defaults and validate the result.
    pub fn from_port(port: &dyn ConfigPort) -> Result<Self, QuantError> {
        let d = EngineConfig::default();

        let horizons = list(port, "geometry", "horizons", d.horizons.to_vec())?;
        let horizons: [usize; 7] =
            horizons
                .try_into()
                .map_err(|v: Vec<usize>| QuantError::ConfigInvalid {
                    section: "geometry".to_string(),
                    key: "horizons".to_string(),
                    reason: format!("expected 7 horizons, got {}", v.len()),
                })?;

        let config = EngineConfig {
            backtest: BacktestConfig {
                initial_capital: port.get_double(
                    "backtest",
                    "initial_capital",
                    d.backtest.initial_capital,
                ),
                risk_free_rate: port.get_double(
                    "backtest",
                    "risk_free_rate",
                    d.backtest.risk_free_rate,
                ),
                min_trade_bars: count(port, "backtest", "min_trade_bars", d.backtest.min_trade_bars)?,
            },
            ma_windows: list(port, "indicators", "ma_windows", d.ma_windows)?,
            zigzag_deviation: port.get_double("zigzag", "deviation", d.zigzag_deviation),
            horizons,
            monthly_geometry: port.get_bool("geometry", "monthly", d.monthly_geometry),
            deduction: DeductionConfig {
                days: count(port, "deduction", "days", d.deduction.days)?,
                drift: port.get_double("deduction", "drift", d.deduction.drift),
                windows: list(port, "deduction", "windows", d.deduction.windows)?,
            },
        };

        validate_engine_config(&config)?;
        tracing::debug!(?config, "engine configuration loaded");
        Ok(config)
    }
}
