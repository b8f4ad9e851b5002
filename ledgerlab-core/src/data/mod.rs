//! Input table reader.
//!
//! Turns a CSV file into [`MarketObservation`]s. Required columns are
//! `date`, `code` and the configured price column; anything else is ignored.
//! Row order is preserved because the engine relies on the caller's order.

pub mod csv_table;

pub use csv_table::{load_observations, read_observations, CODE_COLUMN, DATE_COLUMN};
