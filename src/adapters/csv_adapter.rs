//! CSV file price source.
//!
//! One file per symbol, `<SYMBOL>.csv`, with the header
//! `date,open,high,low,close,volume`. Only `date` and `close` are required;
//! blank open/high/low/volume fields take the degraded-mode defaults.

use crate::domain::error::QuantError;
use crate::domain::ohlcv::{PriceSeries, RawBar};
use crate::ports::data_port::PriceSource;
use chrono::NaiveDate;
use serde::Deserialize;
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Deserialize)]
struct CsvRow {
    date: NaiveDate,
    #[serde(default)]
    open: Option<f64>,
    #[serde(default)]
    high: Option<f64>,
    #[serde(default)]
    low: Option<f64>,
    close: f64,
    #[serde(default)]
    volume: Option<f64>,
}

impl From<CsvRow> for RawBar {
    fn from(row: CsvRow) -> Self {
        RawBar {
            date: row.date,
            open: row.open,
            high: row.high,
            low: row.low,
            close: row.close,
            volume: row.volume,
        }
    }
}

pub struct CsvPriceSource {
    base_path: PathBuf,
}

impl CsvPriceSource {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, symbol: &str) -> PathBuf {
        self.base_path.join(format!("{}.csv", symbol))
    }

    /// Parse CSV text into a validated series.
    pub fn parse(content: &str) -> Result<PriceSeries, QuantError> {
        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(content.as_bytes());

        let mut rows = Vec::new();
        for (line, result) in rdr.deserialize::<CsvRow>().enumerate() {
            let row = result.map_err(|e| QuantError::DataSource {
                reason: format!("CSV row {}: {}", line + 1, e),
            })?;
            rows.push(RawBar::from(row));
        }
        PriceSeries::from_raw(rows)
    }
}

impl PriceSource for CsvPriceSource {
    fn fetch_prices(&self, symbol: &str) -> Result<PriceSeries, QuantError> {
        let path = self.csv_path(symbol);
        let content = fs::read_to_string(&path).map_err(|e| QuantError::DataSource {
            reason: format!("failed to read {}: {}", path.display(), e),
        })?;
        let series = Self::parse(&content)?;
        tracing::debug!(symbol, bars = series.len(), "loaded price history");
        Ok(series)
    }

    fn list_symbols(&self) -> Result<Vec<String>, QuantError> {
        let entries = fs::read_dir(&self.base_path).map_err(|e| QuantError::DataSource {
            reason: format!(
                "failed to read directory {}: {}",
                self.base_path.display(),
                e
            ),
        })?;

        let mut symbols = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| QuantError::DataSource {
                reason: format!("directory entry error: {}", e),
            })?;
            let name = entry.file_name();
            let name_str = name.to_string_lossy();
            if let Some(symbol) = name_str.strip_suffix(".csv") {
                symbols.push(symbol.to_string());
            }
        }

        symbols.sort();
        Ok(symbols)
    }
}
