//! Backtest runner: wires config, data and engine together.
//!
//! Two entry points:
//! - `run_from_config()`: reads the CSV the config points at, then runs. Used by the CLI.
//! - `run_with_observations()`: takes pre-loaded rows. No I/O.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use ledgerlab_core::ledger::LedgerRow;
use ledgerlab_core::{BacktestEngine, DataError, EngineError, MarketObservation, ReportSummary};

use crate::config::{BacktestConfig, ConfigError};
use crate::fingerprint::run_fingerprint;

/// Errors from the runner.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("data error in {path}: {source}")]
    Data { path: PathBuf, source: DataError },
    #[error("no input data: set `backtest.data` in the config or pass a data path")]
    MissingDataPath,
    #[error("engine error: {0}")]
    Engine(#[from] EngineError),
    #[error("engine has not run")]
    NotComputed,
    #[error("fingerprint error: {0}")]
    Fingerprint(#[from] serde_json::Error),
}

impl From<ledgerlab_core::ConfigError> for RunError {
    fn from(err: ledgerlab_core::ConfigError) -> Self {
        Self::Config(ConfigError::Invalid(err))
    }
}

/// Current schema version for persisted artifacts.
pub const SCHEMA_VERSION: u32 = 1;

/// Complete, serializable result of one run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestResult {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub fingerprint: String,
    pub config: BacktestConfig,
    /// Callback names in chain order.
    pub callbacks: Vec<String>,
    pub summary: ReportSummary,
    /// Ledger rows ordered by date.
    pub ledger: Vec<LedgerRow>,
    /// Cash after every trade, starting with the initial cash.
    pub cash_history: Vec<f64>,
    /// The rendered text report.
    pub report: String,
}

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

impl BacktestResult {
    /// Capture a finished engine. `None` if it has not run.
    pub fn from_engine(
        engine: &BacktestEngine,
        config: &BacktestConfig,
        fingerprint: String,
    ) -> Option<Self> {
        let summary = engine.summary()?;
        let ledger = engine.ledger();
        Some(Self {
            schema_version: SCHEMA_VERSION,
            fingerprint,
            config: config.clone(),
            callbacks: engine
                .callbacks()
                .names()
                .into_iter()
                .map(str::to_string)
                .collect(),
            summary,
            ledger: ledger.rows(),
            cash_history: ledger.cash_history().to_vec(),
            report: engine.report(),
        })
    }
}

/// Engine plus result of a run, for callers that need ledger queries.
#[derive(Debug)]
pub struct RunOutcome {
    pub engine: BacktestEngine,
    pub result: BacktestResult,
}

/// Read the observations a config points at.
///
/// `data_override` wins over `backtest.data`.
pub fn load_config_data(
    config: &BacktestConfig,
    data_override: Option<&Path>,
) -> Result<Vec<MarketObservation>, RunError> {
    let path = data_override
        .or(config.backtest.data.as_deref())
        .ok_or(RunError::MissingDataPath)?;
    config
        .engine_config()
        .load_observations(path)
        .map_err(|source| RunError::Data {
            path: path.to_path_buf(),
            source,
        })
}

/// Load data for a config and run it.
///
/// This is the high-level entry point used by the CLI.
pub fn run_from_config(
    config: &BacktestConfig,
    data_override: Option<&Path>,
) -> Result<RunOutcome, RunError> {
    let observations = load_config_data(config, data_override)?;
    run_with_observations(config, observations)
}

/// Run a config against pre-loaded rows.
pub fn run_with_observations(
    config: &BacktestConfig,
    observations: Vec<MarketObservation>,
) -> Result<RunOutcome, RunError> {
    let fingerprint = run_fingerprint(config, &observations)?;
    let chain = config.callback_chain()?;
    let mut engine = BacktestEngine::new(observations, config.engine_config(), chain)?;
    engine.run()?;

    let result = BacktestResult::from_engine(&engine, config, fingerprint)
        .ok_or(RunError::NotComputed)?;
    info!(
        fingerprint = %&result.fingerprint[..12],
        trades = result.summary.trade_count,
        total_assets = result.summary.total_assets,
        "backtest finished"
    );
    Ok(RunOutcome { engine, result })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    const CONFIG: &str = r#"
[backtest]
initial_cash = 1000.0

[[callbacks]]
type = "fixed_lot"

[callbacks.buy]
"000001" = ["1998-01-01", "2000-01-01"]

[callbacks.sell]
"000001" = ["1999-01-01"]
"#;

    fn observations() -> Vec<MarketObservation> {
        vec![
            MarketObservation::new(d(1998, 1, 1), "000001", 4.5),
            MarketObservation::new(d(1999, 1, 1), "000001", 7.9),
            MarketObservation::new(d(2000, 1, 1), "000001", 6.7),
        ]
    }

    #[test]
    fn runs_documented_example() {
        let config = BacktestConfig::from_toml(CONFIG).unwrap();
        let outcome = run_with_observations(&config, observations()).unwrap();
        let result = &outcome.result;

        assert_eq!(result.schema_version, SCHEMA_VERSION);
        assert_eq!(result.callbacks, vec!["fixed_lot"]);
        assert_eq!(result.ledger.len(), 3);
        assert_eq!(result.cash_history.len(), 4);
        assert!((result.summary.available_cash - 653.09).abs() < 0.01);
        assert!((result.summary.total_assets - 1323.09).abs() < 0.01);
        assert_eq!(result.report, outcome.engine.report());
    }

    #[test]
    fn missing_data_path_is_reported() {
        let config = BacktestConfig::from_toml(CONFIG).unwrap();
        assert!(matches!(
            run_from_config(&config, None),
            Err(RunError::MissingDataPath)
        ));
    }

    #[test]
    fn unreadable_data_names_the_path() {
        let config = BacktestConfig::from_toml(CONFIG).unwrap();
        let path = Path::new("definitely/not/here.csv");
        match run_from_config(&config, Some(path)) {
            Err(RunError::Data { path: p, .. }) => assert_eq!(p, path),
            other => panic!("expected data error, got {other:?}"),
        }
    }
}
