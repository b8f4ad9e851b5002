//! Fixed-lot callback: trade one lot on caller-chosen dates.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{Holding, Quote, StrategyCallback};
use crate::domain::{FeeSchedule, QUANTITY_EPSILON};
use crate::error::ConfigError;

/// Default lot size (shares per trade).
pub const DEFAULT_LOT_SIZE: f64 = 100.0;

/// Trading dates per instrument code.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DateBook(BTreeMap<String, BTreeSet<NaiveDate>>);

impl DateBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, code: impl Into<String>, date: NaiveDate) {
        self.0.entry(code.into()).or_default().insert(date);
    }

    /// Builder form of [`insert`](Self::insert) for a whole set of dates.
    pub fn with_dates(
        mut self,
        code: impl Into<String>,
        dates: impl IntoIterator<Item = NaiveDate>,
    ) -> Self {
        self.0.entry(code.into()).or_default().extend(dates);
        self
    }

    pub fn contains(&self, code: &str, date: NaiveDate) -> bool {
        self.0.get(code).is_some_and(|dates| dates.contains(&date))
    }
}

/// Buys and sells exactly one lot on the dates listed in its date books.
///
/// - Buy size: one lot if it is affordable with fees, else 0.
/// - Sell size: one lot if at least a lot is held, else 0.
///
/// The fee schedule must match the engine's; affordability is judged here
/// before the engine books anything.
#[derive(Debug, Clone)]
pub struct FixedLotCallback {
    buy_dates: DateBook,
    sell_dates: DateBook,
    fees: FeeSchedule,
    lot_size: f64,
}

impl FixedLotCallback {
    pub fn new(buy_dates: DateBook, sell_dates: DateBook) -> Self {
        Self {
            buy_dates,
            sell_dates,
            fees: FeeSchedule::default(),
            lot_size: DEFAULT_LOT_SIZE,
        }
    }

    pub fn with_fees(mut self, fees: FeeSchedule) -> Self {
        self.fees = fees;
        self
    }

    pub fn with_lot_size(mut self, lot_size: f64) -> Result<Self, ConfigError> {
        if !lot_size.is_finite() || lot_size <= 0.0 {
            return Err(ConfigError::InvalidLotSize(lot_size));
        }
        self.lot_size = lot_size;
        Ok(self)
    }

    pub fn lot_size(&self) -> f64 {
        self.lot_size
    }

    pub fn fees(&self) -> &FeeSchedule {
        &self.fees
    }
}

impl StrategyCallback for FixedLotCallback {
    fn should_buy(&self, quote: &Quote<'_>) -> bool {
        self.buy_dates.contains(quote.code, quote.date)
    }

    fn should_sell(&self, quote: &Quote<'_>, _holding: Holding) -> bool {
        self.sell_dates.contains(quote.code, quote.date)
    }

    fn size_buy(&self, quote: &Quote<'_>) -> f64 {
        if self.fees.is_affordable(quote.price, self.lot_size, quote.cash) {
            self.lot_size
        } else {
            0.0
        }
    }

    fn size_sell(&self, _quote: &Quote<'_>, holding: Holding) -> f64 {
        if holding.quantity + QUANTITY_EPSILON >= self.lot_size {
            self.lot_size
        } else {
            0.0
        }
    }

    fn name(&self) -> &str {
        "fixed_lot"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn quote(date: NaiveDate, price: f64, cash: f64) -> Quote<'static> {
        Quote {
            date,
            code: "000001",
            price,
            cash,
        }
    }

    fn callback() -> FixedLotCallback {
        FixedLotCallback::new(
            DateBook::new().with_dates("000001", [d(1998, 1, 1), d(2000, 1, 1)]),
            DateBook::new().with_dates("000001", [d(1999, 1, 1)]),
        )
    }

    #[test]
    fn checks_follow_date_books() {
        let cb = callback();
        assert!(cb.should_buy(&quote(d(1998, 1, 1), 4.5, 1000.0)));
        assert!(!cb.should_buy(&quote(d(1999, 1, 1), 7.9, 1000.0)));
        assert!(cb.should_sell(&quote(d(1999, 1, 1), 7.9, 1000.0), Holding::default()));
        assert!(!cb.should_sell(&quote(d(2001, 1, 1), 10.0, 1000.0), Holding::default()));
    }

    #[test]
    fn unknown_code_never_triggers() {
        let cb = callback();
        let q = Quote {
            date: d(1998, 1, 1),
            code: "600000",
            price: 4.5,
            cash: 1000.0,
        };
        assert!(!cb.should_buy(&q));
    }

    #[test]
    fn buys_one_lot_when_affordable() {
        let cb = callback();
        // 450 + 5 + 0.45 = 455.45
        let cost = cb.fees().buy_cost(4.5, 100.0);
        assert_eq!(cb.size_buy(&quote(d(1998, 1, 1), 4.5, cost)), 100.0);
        assert_eq!(cb.size_buy(&quote(d(1998, 1, 1), 4.5, cost - 0.01)), 0.0);
    }

    #[test]
    fn sells_one_lot_only_when_held() {
        let cb = callback();
        let q = quote(d(1999, 1, 1), 7.9, 0.0);
        let held = |quantity| Holding {
            quantity,
            avg_cost: 4.5,
        };
        assert_eq!(cb.size_sell(&q, held(250.0)), 100.0);
        assert_eq!(cb.size_sell(&q, held(100.0)), 100.0);
        assert_eq!(cb.size_sell(&q, held(99.0)), 0.0);
        assert_eq!(cb.size_sell(&q, Holding::default()), 0.0);
    }

    #[test]
    fn custom_lot_size() {
        let cb = callback().with_lot_size(10.0).unwrap();
        assert_eq!(cb.size_buy(&quote(d(1998, 1, 1), 4.5, 1000.0)), 10.0);
        assert!(matches!(
            callback().with_lot_size(0.0),
            Err(ConfigError::InvalidLotSize(_))
        ));
        assert!(callback().with_lot_size(f64::NAN).is_err());
    }

    #[test]
    fn fractional_lot_sells_through_rounding_residue() {
        let cb = callback().with_lot_size(0.1).unwrap();
        let q = quote(d(1999, 1, 1), 7.9, 0.0);
        let held = Holding {
            quantity: 0.3 - 0.1 - 0.1,
            avg_cost: 4.5,
        };
        assert!(held.quantity < 0.1);
        assert_eq!(cb.size_sell(&q, held), 0.1);
    }

    #[test]
    fn date_book_contains() {
        let mut book = DateBook::new();
        book.insert("000001", d(2020, 5, 1));
        assert!(book.contains("000001", d(2020, 5, 1)));
        assert!(!book.contains("000001", d(2020, 5, 2)));
        assert!(!book.contains("000002", d(2020, 5, 1)));
    }
}
