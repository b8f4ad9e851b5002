//! Error types for the core crate.
//!
//! Skipped trades (not enough cash, nothing to sell) are not errors and never
//! show up here. Everything below aborts before or during a run.

use thiserror::Error;

use crate::domain::Direction;

/// Invalid engine or callback configuration. Raised before simulation starts.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("callback chain is empty (use the default no-op chain instead)")]
    EmptyCallbackChain,

    #[error("invalid value for '{field}': {value}")]
    InvalidValue { field: String, value: f64 },

    #[error("lot size must be positive, got {0}")]
    InvalidLotSize(f64),
}

/// Problems with the input price table.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("missing required column '{0}'")]
    MissingColumn(String),

    #[error("row {row}: cannot parse date '{value}' (expected YYYY-MM-DD)")]
    InvalidDate { row: usize, value: String },

    #[error("row {row}: cannot parse price '{value}' in column '{column}'")]
    InvalidPrice {
        row: usize,
        column: String,
        value: String,
    },

    #[error("row {row}: price must be finite and positive, got {price}")]
    NonPositivePrice { row: usize, price: f64 },

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failures while the simulation loop is running.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A callback returned a sizing value the engine cannot book.
    #[error("callback '{callback}' returned invalid {side} size {amount}")]
    InvalidSize {
        callback: String,
        side: Direction,
        amount: f64,
    },
}
