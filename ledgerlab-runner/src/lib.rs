//! LedgerLab Runner — config files, run orchestration and artifacts.
//!
//! This crate builds on `ledgerlab-core` to provide:
//! - TOML run configuration and callback-chain construction
//! - Single-run orchestration from config to finished engine
//! - Run fingerprinting
//! - CSV/JSON/text artifact export

pub mod config;
pub mod export;
pub mod fingerprint;
pub mod runner;

pub use config::{BacktestConfig, BacktestSection, CallbackConfig, ConfigError, DateCallbackConfig};
pub use export::{export_json, export_ledger_csv, export_ledger_json, import_json, save_artifacts};
pub use fingerprint::run_fingerprint;
pub use runner::{
    load_config_data, run_from_config, run_with_observations, BacktestResult, RunError,
    RunOutcome, SCHEMA_VERSION,
};

#[cfg(test)]
mod send_sync_checks {
    use super::*;

    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}

    #[test]
    fn config_types_are_send_sync() {
        assert_send::<BacktestConfig>();
        assert_sync::<BacktestConfig>();
        assert_send::<CallbackConfig>();
        assert_sync::<CallbackConfig>();
    }

    #[test]
    fn result_types_are_send_sync() {
        assert_send::<BacktestResult>();
        assert_sync::<BacktestResult>();
        assert_send::<RunOutcome>();
        assert_sync::<RunOutcome>();
    }
}
