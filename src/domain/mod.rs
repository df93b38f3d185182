//! Core engine types and logic. Every function here is a pure transform over
//! in-memory series; nothing performs I/O.

pub mod ohlcv;
pub mod indicator;
pub mod deduction;
pub mod zigzag;
pub mod wave;
pub mod geometry;
pub mod rating;
pub mod metrics;
pub mod backtest;
pub mod strategy;
pub mod scorecard;
pub mod universe;
pub mod config;
pub mod config_validation;
pub mod error;
