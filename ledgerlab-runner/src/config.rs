//! TOML run configuration.
//!
//! A run file names the input table, the engine settings and the callback
//! chain:
//!
//! ```toml
//! [backtest]
//! data = "prices.csv"
//! initial_cash = 1000.0
//!
//! [fees]
//! min_commission = 5.0
//!
//! [[callbacks]]
//! type = "fixed_lot"
//! [callbacks.buy]
//! "000001" = ["1998-01-01", "2000-01-01"]
//! [callbacks.sell]
//! "000001" = ["1999-01-01"]
//! ```
//!
//! Callbacks without their own `fees` table inherit the top-level `[fees]`,
//! so affordability checks use the same formula as the engine.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use ledgerlab_core::callback::{
    CallbackChain, DateBook, FixedLotCallback, FullAllocationCallback, NoOpCallback,
    StrategyCallback, DEFAULT_LOT_SIZE,
};
use ledgerlab_core::domain::FeeSchedule;
use ledgerlab_core::engine::{EngineConfig, DEFAULT_INITIAL_CASH, DEFAULT_PRICE_COLUMN};

/// Errors from loading or validating a run configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(#[from] ledgerlab_core::ConfigError),
}

/// Complete description of one backtest run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestConfig {
    #[serde(default)]
    pub backtest: BacktestSection,
    #[serde(default)]
    pub fees: FeeSchedule,
    /// `None` means the default no-op chain; an explicit empty list is an error.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub callbacks: Option<Vec<CallbackConfig>>,
}

/// `[backtest]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BacktestSection {
    /// Input CSV. Relative paths are resolved against the config file.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<PathBuf>,
    pub initial_cash: f64,
    pub price_column: String,
}

impl Default for BacktestSection {
    fn default() -> Self {
        Self {
            data: None,
            initial_cash: DEFAULT_INITIAL_CASH,
            price_column: DEFAULT_PRICE_COLUMN.to_string(),
        }
    }
}

/// One entry of the `[[callbacks]]` array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CallbackConfig {
    /// Never trades.
    NoOp,

    /// One lot per listed date.
    FixedLot(DateCallbackConfig),

    /// All cash in whole lots on buy dates, whole holding on sell dates.
    FullAllocation(DateCallbackConfig),
}

/// Parameters shared by the date-driven callbacks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DateCallbackConfig {
    #[serde(default = "default_lot_size")]
    pub lot_size: f64,
    #[serde(default)]
    pub buy: DateBook,
    #[serde(default)]
    pub sell: DateBook,
    /// Overrides the top-level `[fees]` for this callback only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fees: Option<FeeSchedule>,
}

fn default_lot_size() -> f64 {
    DEFAULT_LOT_SIZE
}

impl BacktestConfig {
    /// Load a config from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::from_toml(&content)?;
        if let (Some(data), Some(dir)) = (config.backtest.data.as_ref(), path.parent()) {
            if data.is_relative() {
                config.backtest.data = Some(dir.join(data));
            }
        }
        Ok(config)
    }

    /// Parse and validate a config from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check everything the engine would reject, before any data is read.
    pub fn validate(&self) -> Result<(), ledgerlab_core::ConfigError> {
        self.engine_config().validate()?;
        self.callback_chain().map(|_| ())
    }

    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig::new(self.backtest.initial_cash)
            .with_fees(self.fees)
            .with_price_column(self.backtest.price_column.clone())
    }

    /// Build the callback chain in file order.
    pub fn callback_chain(&self) -> Result<CallbackChain, ledgerlab_core::ConfigError> {
        let Some(entries) = &self.callbacks else {
            return Ok(CallbackChain::default());
        };
        let callbacks = entries
            .iter()
            .map(|entry| self.build_callback(entry))
            .collect::<Result<Vec<_>, _>>()?;
        CallbackChain::new(callbacks)
    }

    fn build_callback(
        &self,
        entry: &CallbackConfig,
    ) -> Result<Box<dyn StrategyCallback>, ledgerlab_core::ConfigError> {
        Ok(match entry {
            CallbackConfig::NoOp => Box::new(NoOpCallback),
            CallbackConfig::FixedLot(params) => Box::new(self.fixed_lot(params)?),
            CallbackConfig::FullAllocation(params) => Box::new(
                FullAllocationCallback::from_fixed_lot(self.fixed_lot(params)?),
            ),
        })
    }

    fn fixed_lot(
        &self,
        params: &DateCallbackConfig,
    ) -> Result<FixedLotCallback, ledgerlab_core::ConfigError> {
        let fees = params.fees.unwrap_or(self.fees);
        fees.validate()?;
        FixedLotCallback::new(params.buy.clone(), params.sell.clone())
            .with_fees(fees)
            .with_lot_size(params.lot_size)
    }
}
