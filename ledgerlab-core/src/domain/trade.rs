//! One executed ledger entry.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Side of a trade. The discriminant is the sign applied to the amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Buy,
    Sell,
}

impl Direction {
    /// `+1` for buys, `-1` for sells.
    pub fn sign(self) -> i8 {
        match self {
            Self::Buy => 1,
            Self::Sell => -1,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Buy => "buy",
            Self::Sell => "sell",
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An executed trade as recorded in the ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub date: NaiveDate,
    pub code: String,
    pub price: f64,
    /// `amount * direction.sign()`
    pub signed_amount: f64,
    /// Cash balance right after this trade settled.
    pub cash_after: f64,
    pub commission: f64,
    pub tax: f64,
    /// `price * amount + commission + tax`, for both directions.
    pub total_value: f64,
    pub direction: Direction,
}

impl Trade {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        date: NaiveDate,
        code: impl Into<String>,
        price: f64,
        amount: f64,
        cash_after: f64,
        commission: f64,
        tax: f64,
        direction: Direction,
    ) -> Self {
        Self {
            date,
            code: code.into(),
            price,
            signed_amount: amount * f64::from(direction.sign()),
            cash_after,
            commission,
            tax,
            total_value: price * amount + commission + tax,
            direction,
        }
    }

    /// Unsigned traded quantity.
    pub fn amount(&self) -> f64 {
        self.signed_amount.abs()
    }
}
