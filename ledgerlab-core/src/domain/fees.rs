//! Commission and tax formulas shared by the engine and the callbacks.
//!
//! Callbacks check affordability before the engine records a trade, so both
//! sides must price a trade with exactly the same formula. Keeping it in one
//! type makes that true by construction.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Default stamp-tax rate.
pub const DEFAULT_TAX_RATE: f64 = 0.001;
/// Default commission rate.
pub const DEFAULT_COMMISSION_RATE: f64 = 0.001;
/// Default commission floor per trade.
pub const DEFAULT_MIN_COMMISSION: f64 = 5.0;

/// Per-trade cost model: proportional commission with a floor, plus a
/// proportional tax.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeeSchedule {
    pub tax_rate: f64,
    pub commission_rate: f64,
    pub min_commission: f64,
}

impl Default for FeeSchedule {
    fn default() -> Self {
        Self {
            tax_rate: DEFAULT_TAX_RATE,
            commission_rate: DEFAULT_COMMISSION_RATE,
            min_commission: DEFAULT_MIN_COMMISSION,
        }
    }
}

impl FeeSchedule {
    pub fn new(tax_rate: f64, commission_rate: f64, min_commission: f64) -> Self {
        Self {
            tax_rate,
            commission_rate,
            min_commission,
        }
    }

    /// No commission, no tax.
    pub fn frictionless() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }

    /// `max(price * amount * commission_rate, min_commission)`
    pub fn commission(&self, price: f64, amount: f64) -> f64 {
        (price * amount * self.commission_rate).max(self.min_commission)
    }

    /// `price * amount * tax_rate`
    pub fn tax(&self, price: f64, amount: f64) -> f64 {
        price * amount * self.tax_rate
    }

    /// Cash needed to buy `amount` at `price`, fees included.
    pub fn buy_cost(&self, price: f64, amount: f64) -> f64 {
        price * amount + self.commission(price, amount) + self.tax(price, amount)
    }

    /// Cash received from selling `amount` at `price`, net of fees.
    pub fn sell_proceeds(&self, price: f64, amount: f64) -> f64 {
        price * amount - self.commission(price, amount) - self.tax(price, amount)
    }

    /// Whether `amount` at `price` can be paid for out of `cash`.
    ///
    /// Inclusive: a cost equal to the available cash is affordable.
    pub fn is_affordable(&self, price: f64, amount: f64, cash: f64) -> bool {
        self.buy_cost(price, amount) <= cash
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("tax_rate", self.tax_rate),
            ("commission_rate", self.commission_rate),
            ("min_commission", self.min_commission),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidValue {
                    field: field.to_string(),
                    value,
                });
            }
        }
        Ok(())
    }
}
