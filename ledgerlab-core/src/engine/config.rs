//! Engine configuration.

use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::data;
use crate::domain::{FeeSchedule, MarketObservation};
use crate::error::{ConfigError, DataError};

/// Default starting cash.
pub const DEFAULT_INITIAL_CASH: f64 = 10_000.0;
/// Default name of the price column in the input table.
pub const DEFAULT_PRICE_COLUMN: &str = "close";

/// Settings fixed for the lifetime of one engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub initial_cash: f64,
    pub fees: FeeSchedule,
    /// Column of the input table that supplies the trade price.
    pub price_column: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            initial_cash: DEFAULT_INITIAL_CASH,
            fees: FeeSchedule::default(),
            price_column: DEFAULT_PRICE_COLUMN.to_string(),
        }
    }
}

impl EngineConfig {
    pub fn new(initial_cash: f64) -> Self {
        Self {
            initial_cash,
            ..Self::default()
        }
    }

    pub fn with_fees(mut self, fees: FeeSchedule) -> Self {
        self.fees = fees;
        self
    }

    pub fn with_price_column(mut self, column: impl Into<String>) -> Self {
        self.price_column = column.into();
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.initial_cash.is_finite() || self.initial_cash < 0.0 {
            return Err(ConfigError::InvalidValue {
                field: "initial_cash".into(),
                value: self.initial_cash,
            });
        }
        self.fees.validate()
    }

    /// Read observations from a CSV source, pricing rows from `price_column`.
    pub fn read_observations<R: Read>(
        &self,
        reader: R,
    ) -> Result<Vec<MarketObservation>, DataError> {
        data::read_observations(reader, &self.price_column)
    }

    /// Read observations from a CSV file, pricing rows from `price_column`.
    pub fn load_observations(&self, path: &Path) -> Result<Vec<MarketObservation>, DataError> {
        data::load_observations(path, &self.price_column)
    }
}
