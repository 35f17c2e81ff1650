//! Core domain types and logic.

pub mod ohlcv;
pub mod indicator;
pub mod signal;
pub mod strategy;
pub mod registry;
pub mod position;
pub mod simulator;
pub mod metrics;
pub mod backtest;
pub mod config_validation;
pub mod error;
