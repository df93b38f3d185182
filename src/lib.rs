//! cbquant: signal, projection and backtesting engine for listed equities
//! and convertible-bond underlyings.
//!
//! Hexagonal architecture: pure engine logic in [`domain`], port traits in
//! [`ports`], concrete collaborators (CSV prices, INI config) in [`adapters`].

pub mod domain;
pub mod ports;
pub mod adapters;
pub mod cli;
