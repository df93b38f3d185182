//! Price data port trait.

use crate::domain::error::QuantError;
use crate::domain::ohlcv::PriceSeries;

/// A collaborator that supplies validated price history per symbol.
///
/// Implementations must be shareable across threads so batch scans can fan
/// out over symbols.
pub trait PriceSource: Send + Sync {
    fn fetch_prices(&self, symbol: &str) -> Result<PriceSeries, QuantError>;

    fn list_symbols(&self) -> Result<Vec<String>, QuantError>;
}
