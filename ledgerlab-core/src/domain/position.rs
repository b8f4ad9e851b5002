use serde::{Deserialize, Serialize};

/// Net quantities within this distance of zero count as flat.
///
/// Fractional lots (0.1 + 0.1 + 0.1 - 0.1 - 0.1 - 0.1) leave binary rounding
/// residue in the order of 1e-17 instead of an exact zero.
pub const QUANTITY_EPSILON: f64 = 1e-9;

/// Whether a net signed quantity is flat.
pub fn is_flat_quantity(quantity: f64) -> bool {
    quantity.abs() <= QUANTITY_EPSILON
}

/// Weighted average entry price and size of an open position.
///
/// Derived from the ledger, never stored independently. Only trades after
/// the instrument's most recent flat point contribute.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CostBasis {
    pub avg_cost: f64,
    pub open_quantity: f64,
}

impl CostBasis {
    /// Holding valued at its own cost basis.
    pub fn book_value(&self) -> f64 {
        self.avg_cost * self.open_quantity
    }
}
