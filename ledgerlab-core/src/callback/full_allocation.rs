//! Full-allocation callback: spend all cash in whole lots, sell everything.

use super::{DateBook, FixedLotCallback, Holding, Quote, StrategyCallback};
use crate::domain::FeeSchedule;
use crate::error::ConfigError;

/// Same dates as [`FixedLotCallback`], different sizing.
///
/// - Buy size: the largest multiple of the lot affordable with fees.
/// - Sell size: the whole open quantity.
///
/// The buy size is found by stepping one lot at a time until the next step
/// is unaffordable. The commission floor makes cost non-linear for small
/// orders, so a closed-form `cash / price` would over- or under-shoot.
#[derive(Debug, Clone)]
pub struct FullAllocationCallback {
    dates: FixedLotCallback,
}

impl FullAllocationCallback {
    pub fn new(buy_dates: DateBook, sell_dates: DateBook) -> Self {
        Self {
            dates: FixedLotCallback::new(buy_dates, sell_dates),
        }
    }

    pub fn from_fixed_lot(dates: FixedLotCallback) -> Self {
        Self { dates }
    }

    pub fn with_fees(self, fees: FeeSchedule) -> Self {
        Self {
            dates: self.dates.with_fees(fees),
        }
    }

    pub fn with_lot_size(self, lot_size: f64) -> Result<Self, ConfigError> {
        Ok(Self {
            dates: self.dates.with_lot_size(lot_size)?,
        })
    }
}

impl StrategyCallback for FullAllocationCallback {
    fn should_buy(&self, quote: &Quote<'_>) -> bool {
        self.dates.should_buy(quote)
    }

    fn should_sell(&self, quote: &Quote<'_>, holding: Holding) -> bool {
        self.dates.should_sell(quote, holding)
    }

    fn size_buy(&self, quote: &Quote<'_>) -> f64 {
        // Stepping never terminates on a free instrument or unbounded cash.
        if !quote.price.is_finite() || quote.price <= 0.0 || !quote.cash.is_finite() {
            return 0.0;
        }
        let lot = self.dates.lot_size();
        let fees = self.dates.fees();
        let mut amount = lot;
        while fees.is_affordable(quote.price, amount, quote.cash) {
            amount += lot;
        }
        amount - lot
    }

    fn size_sell(&self, _quote: &Quote<'_>, holding: Holding) -> f64 {
        holding.quantity.max(0.0)
    }

    fn name(&self) -> &str {
        "full_allocation"
    }
}
