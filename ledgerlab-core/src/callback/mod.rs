//! The pluggable decision and sizing protocol.
//!
//! A callback answers four questions about the current observation: buy?,
//! sell?, how many to buy?, how many to sell? Returning `false` or `0.0`
//! means "no opinion", never "forbid". Several callbacks form a
//! [`CallbackChain`] consulted in priority order.

pub mod fixed_lot;
pub mod full_allocation;

pub use fixed_lot::{DateBook, FixedLotCallback, DEFAULT_LOT_SIZE};
pub use full_allocation::FullAllocationCallback;

use chrono::NaiveDate;

use crate::domain::CostBasis;
use crate::error::ConfigError;

/// What a callback gets to see about the current observation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quote<'a> {
    pub date: NaiveDate,
    pub code: &'a str,
    pub price: f64,
    /// Cash available before any trade on this observation's step.
    pub cash: f64,
}

/// The currently open position for the quoted code.
///
/// Both fields are zero when the code is flat or has never traded.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Holding {
    pub quantity: f64,
    pub avg_cost: f64,
}

impl From<Option<CostBasis>> for Holding {
    fn from(basis: Option<CostBasis>) -> Self {
        basis
            .map(|b| Holding {
                quantity: b.open_quantity,
                avg_cost: b.avg_cost,
            })
            .unwrap_or_default()
    }
}

/// Decision and sizing protocol consulted by the engine.
///
/// Every method has a "no opinion" default so implementations only override
/// what they care about.
///
/// # Contract
/// - Sizes are unsigned quantities. Negative, NaN or infinite sizes abort the
///   run.
/// - The engine does not check a sell size against the open quantity; a
///   callback that oversells opens a short position.
pub trait StrategyCallback: Send + Sync {
    fn should_buy(&self, _quote: &Quote<'_>) -> bool {
        false
    }

    fn should_sell(&self, _quote: &Quote<'_>, _holding: Holding) -> bool {
        false
    }

    fn size_buy(&self, _quote: &Quote<'_>) -> f64 {
        0.0
    }

    fn size_sell(&self, _quote: &Quote<'_>, _holding: Holding) -> f64 {
        0.0
    }

    /// Callback name for logs and error messages
    fn name(&self) -> &str;
}

/// Callback that never trades.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpCallback;

impl StrategyCallback for NoOpCallback {
    fn name(&self) -> &str {
        "no_op"
    }
}

/// Ordered list of callbacks consulted as a priority chain.
///
/// - The first callback whose check returns `true` triggers the action.
/// - The first callback whose sizing returns a non-zero value decides the
///   amount, regardless of which callback's check fired.
///
/// Both lookups stop at the first hit.
pub struct CallbackChain {
    callbacks: Vec<Box<dyn StrategyCallback>>,
}

impl CallbackChain {
    /// Build a chain from an explicit list. An empty list is rejected.
    pub fn new(callbacks: Vec<Box<dyn StrategyCallback>>) -> Result<Self, ConfigError> {
        if callbacks.is_empty() {
            return Err(ConfigError::EmptyCallbackChain);
        }
        Ok(Self { callbacks })
    }

    /// Chain with a single callback.
    pub fn single(callback: impl StrategyCallback + 'static) -> Self {
        Self {
            callbacks: vec![Box::new(callback)],
        }
    }

    pub fn len(&self) -> usize {
        self.callbacks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.callbacks.is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        self.callbacks.iter().map(|cb| cb.name()).collect()
    }

    /// First callback that wants to buy, if any.
    pub fn buy_trigger(&self, quote: &Quote<'_>) -> Option<&dyn StrategyCallback> {
        self.callbacks
            .iter()
            .map(|cb| cb.as_ref())
            .find(|cb| cb.should_buy(quote))
    }

    /// First callback that wants to sell, if any.
    pub fn sell_trigger(
        &self,
        quote: &Quote<'_>,
        holding: Holding,
    ) -> Option<&dyn StrategyCallback> {
        self.callbacks
            .iter()
            .map(|cb| cb.as_ref())
            .find(|cb| cb.should_sell(quote, holding))
    }

    /// First non-zero buy size, with the name of the callback that gave it.
    ///
    /// NaN counts as non-zero so that it reaches validation instead of being
    /// silently skipped.
    pub fn buy_size(&self, quote: &Quote<'_>) -> Option<(&str, f64)> {
        self.callbacks.iter().find_map(|cb| {
            let amount = cb.size_buy(quote);
            (amount != 0.0).then(|| (cb.name(), amount))
        })
    }

    /// First non-zero sell size, with the name of the callback that gave it.
    pub fn sell_size(&self, quote: &Quote<'_>, holding: Holding) -> Option<(&str, f64)> {
        self.callbacks.iter().find_map(|cb| {
            let amount = cb.size_sell(quote, holding);
            (amount != 0.0).then(|| (cb.name(), amount))
        })
    }
}

impl Default for CallbackChain {
    fn default() -> Self {
        Self::single(NoOpCallback)
    }
}

impl std::fmt::Debug for CallbackChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallbackChain")
            .field("callbacks", &self.names())
            .finish()
    }
}
