//! LedgerLab Core — sequential backtesting over a price table.
//!
//! This crate contains the whole simulation:
//! - Domain types (observations, trades, cost basis, fee schedule)
//! - The `StrategyCallback` protocol and its built-in variants
//! - The append-only ledger with flat-point cost-basis reconstruction
//! - The backtest engine (buy check, then sell check, per observation)
//! - The text reporter
//! - A CSV reader for the input table

pub mod callback;
pub mod data;
pub mod domain;
pub mod engine;
pub mod error;
pub mod ledger;
pub mod report;

pub use callback::{
    CallbackChain, FixedLotCallback, FullAllocationCallback, Holding, NoOpCallback, Quote,
    StrategyCallback,
};
pub use domain::{CostBasis, Direction, FeeSchedule, MarketObservation, Trade};
pub use engine::{BacktestEngine, EngineConfig};
pub use error::{ConfigError, DataError, EngineError};
pub use ledger::Ledger;
pub use report::{render_report, ReportSummary, NOT_COMPUTED_MESSAGE};

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: core types can move to and be shared across threads.
    ///
    /// Independent engines may run on separate threads even though a single
    /// engine is strictly sequential.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        require_send::<MarketObservation>();
        require_sync::<MarketObservation>();
        require_send::<Trade>();
        require_sync::<Trade>();
        require_send::<CostBasis>();
        require_sync::<CostBasis>();
        require_send::<FeeSchedule>();
        require_sync::<FeeSchedule>();
        require_send::<Ledger>();
        require_sync::<Ledger>();
        require_send::<CallbackChain>();
        require_sync::<CallbackChain>();
        require_send::<BacktestEngine>();
        require_sync::<BacktestEngine>();
        require_send::<ReportSummary>();
        require_sync::<ReportSummary>();
    }

    /// Architecture contract: callbacks only see the quote and the holding.
    ///
    /// The trait signatures take no ledger or engine reference, so a callback
    /// cannot mutate financial state. If this compiles, the contract holds.
    #[test]
    fn callback_trait_has_no_ledger_parameter() {
        fn _check_trait_object_builds(
            cb: &dyn StrategyCallback,
            quote: &Quote<'_>,
            holding: Holding,
        ) -> (bool, bool, f64, f64) {
            (
                cb.should_buy(quote),
                cb.should_sell(quote, holding),
                cb.size_buy(quote),
                cb.size_sell(quote, holding),
            )
        }
    }
}
