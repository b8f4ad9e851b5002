//! Backtesting engine — sequential walk over the observations.
//!
//! Two phases per observation, always in this order and both evaluated:
//!
//! 1. Buy check: ask the chain, size, book if affordable
//! 2. Sell check: ask the chain, size, book if there is a holding
//!
//! A single row can therefore record a buy and a sell of the same code.

pub mod config;
pub mod loop_runner;

pub use config::{EngineConfig, DEFAULT_INITIAL_CASH, DEFAULT_PRICE_COLUMN};
pub use loop_runner::BacktestEngine;
