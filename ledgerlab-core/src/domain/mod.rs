//! Domain types for LedgerLab

pub mod fees;
pub mod observation;
pub mod position;
pub mod trade;

pub use fees::FeeSchedule;
pub use observation::MarketObservation;
pub use position::{is_flat_quantity, CostBasis, QUANTITY_EPSILON};
pub use trade::{Direction, Trade};

