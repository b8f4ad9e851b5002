//! One input row of the price table.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A single `(date, code, price)` row.
///
/// Observations are consumed in the order they are given. The engine never
/// re-sorts them, so callers must hand them over already ordered by date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketObservation {
    pub date: NaiveDate,
    pub code: String,
    pub price: f64,
}

impl MarketObservation {
    pub fn new(date: NaiveDate, code: impl Into<String>, price: f64) -> Self {
        Self {
            date,
            code: code.into(),
            price,
        }
    }

    /// A usable price is finite and strictly positive.
    pub fn has_valid_price(&self) -> bool {
        self.price.is_finite() && self.price > 0.0
    }
}
