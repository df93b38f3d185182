#![allow(dead_code)]

use cbquant::domain::error::QuantError;
use cbquant::domain::ohlcv::PriceSeries;
use cbquant::ports::data_port::PriceSource;
use chrono::NaiveDate;
use std::collections::HashMap;
use std::io::Write;
use std::path::Path;

pub fn start_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2020, 1, 1).unwrap()
}

pub fn series_from_closes(closes: &[f64]) -> PriceSeries {
    PriceSeries::from_closes(start_date(), closes).unwrap()
}

/// 100, 100.5, 101, ...
pub fn rising_closes(n: usize) -> Vec<f64> {
    (0..n).map(|i| 100.0 + 0.5 * i as f64).collect()
}

pub fn falling_closes(n: usize) -> Vec<f64> {
    (0..n).map(|i| 300.0 - 0.5 * i as f64).collect()
}

pub fn flat_closes(n: usize, price: f64) -> Vec<f64> {
    vec![price; n]
}

/// Sine wave around 100 with the given amplitude and period in bars.
pub fn oscillating_closes(n: usize, amplitude: f64, period: f64) -> Vec<f64> {
    (0..n)
        .map(|i| 100.0 + amplitude * (i as f64 * std::f64::consts::TAU / period).sin())
        .collect()
}

pub struct MockPriceSource {
    pub data: HashMap<String, PriceSeries>,
    pub errors: HashMap<String, String>,
}

impl MockPriceSource {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_closes(mut self, symbol: &str, closes: &[f64]) -> Self {
        self.data
            .insert(symbol.to_string(), series_from_closes(closes));
        self
    }

    pub fn with_error(mut self, symbol: &str, reason: &str) -> Self {
        self.errors.insert(symbol.to_string(), reason.to_string());
        self
    }
}

impl PriceSource for MockPriceSource {
    fn fetch_prices(&self, symbol: &str) -> Result<PriceSeries, QuantError> {
        if let Some(reason) = self.errors.get(symbol) {
            return Err(QuantError::DataSource {
                reason: reason.clone(),
            });
        }
        self.data
            .get(symbol)
            .cloned()
            .ok_or_else(|| QuantError::DataSource {
                reason: format!("no data for {}", symbol),
            })
    }

    fn list_symbols(&self) -> Result<Vec<String>, QuantError> {
        let mut symbols: Vec<String> = self.data.keys().cloned().collect();
        symbols.sort();
        Ok(symbols)
    }
}

/// Write `<dir>/<symbol>.csv` with daily bars starting at [`start_date`].
pub fn write_price_csv(dir: &Path, symbol: &str, closes: &[f64]) {
    let mut file = std::fs::File::create(dir.join(format!("{}.csv", symbol))).unwrap();
    writeln!(file, "date,open,high,low,close,volume").unwrap();
    for (i, close) in closes.iter().enumerate() {
        let date = start_date() + chrono::Duration::days(i as i64);
        writeln!(
            file,
            "{},{},{},{},{},1000",
            date,
            close,
            close * 1.01,
            close * 0.99,
            close
        )
        .unwrap();
    }
}

pub fn write_temp_ini(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}
