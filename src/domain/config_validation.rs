//! Configuration validation.
//!
//! Validates every engine parameter before any computation runs.

use crate::domain::config::EngineConfig;
use crate::domain::error::QuantError;

/// Upper bound on forecast length, roughly one trading year.
pub const MAX_DEDUCTION_DAYS: usize = 250;

fn invalid(section: &str, key: &str, reason: &str) -> QuantError {
    QuantError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.to_string(),
    }
}

pub fn validate_engine_config(config: &EngineConfig) -> Result<(), QuantError> {
    validate_initial_capital(config)?;
    validate_risk_free_rate(config)?;
    validate_windows("indicators", "ma_windows", &config.ma_windows)?;
    validate_deviation(config)?;
    validate_horizons(config)?;
    validate_deduction(config)?;
    Ok(())
}

fn validate_initial_capital(config: &EngineConfig) -> Result<(), QuantError> {
    let value = config.backtest.initial_capital;
    if !(value > 0.0 && value.is_finite()) {
        return Err(invalid(
            "backtest",
            "initial_capital",
            "initial_capital must be positive",
        ));
    }
    Ok(())
}

fn validate_risk_free_rate(config: &EngineConfig) -> Result<(), QuantError> {
    let value = config.backtest.risk_free_rate;
    if !(0.0..1.0).contains(&value) {
        return Err(invalid(
            "backtest",
            "risk_free_rate",
            "risk_free_rate must be between 0 and 1",
        ));
    }
    Ok(())
}

fn validate_windows(section: &str, key: &str, windows: &[usize]) -> Result<(), QuantError> {
    if windows.is_empty() {
        return Err(invalid(section, key, "at least one window is required"));
    }
    if windows.contains(&0) {
        return Err(invalid(section, key, "windows must be positive"));
    }
    Ok(())
}

fn validate_deviation(config: &EngineConfig) -> Result<(), QuantError> {
    let value = config.zigzag_deviation;
    if !(value > 0.0 && value < 1.0) {
        return Err(invalid(
            "zigzag",
            "deviation",
            "deviation must be between 0 and 1 (exclusive)",
        ));
    }
    Ok(())
}

fn validate_horizons(config: &EngineConfig) -> Result<(), QuantError> {
    if config.horizons.contains(&0) {
        return Err(invalid("geometry", "horizons", "horizons must be positive"));
    }
    Ok(())
}

fn validate_deduction(config: &EngineConfig) -> Result<(), QuantError> {
    let d = &config.deduction;
    if !(1..=MAX_DEDUCTION_DAYS).contains(&d.days) {
        return Err(invalid(
            "deduction",
            "days",
            "days must be between 1 and 250",
        ));
    }
    if !(d.drift > -1.0 && d.drift < 1.0) {
        return Err(invalid(
            "deduction",
            "drift",
            "drift must be between -1 and 1 (exclusive)",
        ));
    }
    validate_windows("deduction", "windows", &d.windows)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_invalid(config: EngineConfig, expected_key: &str) {
        match validate_engine_config(&config) {
            Err(QuantError::ConfigInvalid { key, .. }) => assert_eq!(key, expected_key),
            other => panic!("expected ConfigInvalid for {}, got {:?}", expected_key, other),
        }
    }

    #[test]
    fn defaults_pass() {
        assert!(validate_engine_config(&EngineConfig::default()).is_ok());
    }

    #[test]
    fn initial_capital_must_be_positive() {
        let mut c = EngineConfig::default();
        c.backtest.initial_capital = 0.0;
        assert_invalid(c, "initial_capital");
    }

    #[test]
    fn risk_free_rate_range() {
        let mut c = EngineConfig::default();
        c.backtest.risk_free_rate = 1.0;
        assert_invalid(c.clone(), "risk_free_rate");
        c.backtest.risk_free_rate = -0.01;
        assert_invalid(c, "risk_free_rate");
    }

    #[test]
    fn ma_windows_non_empty_and_positive() {
        let mut c = EngineConfig::default();
        c.ma_windows = vec![];
        assert_invalid(c.clone(), "ma_windows");
        c.ma_windows = vec![20, 0];
        assert_invalid(c, "ma_windows");
    }

    #[test]
    fn deviation_range() {
        let mut c = EngineConfig::default();
        c.zigzag_deviation = 0.0;
        assert_invalid(c.clone(), "deviation");
        c.zigzag_deviation = 1.0;
        assert_invalid(c, "deviation");
    }

    #[test]
    fn zero_horizon_fails() {
        let mut c = EngineConfig::default();
        c.horizons[6] = 0;
        assert_invalid(c, "horizons");
    }

    #[test]
    fn deduction_bounds() {
        let mut c = EngineConfig::default();
        c.deduction.days = 0;
        assert_invalid(c.clone(), "days");
        c.deduction.days = 251;
        assert_invalid(c.clone(), "days");
        c.deduction.days = 20;
        c.deduction.drift = -1.0;
        assert_invalid(c.clone(), "drift");
        c.deduction.drift = 0.0;
        c.deduction.windows = vec![];
        assert_invalid(c, "windows");
    }
}
