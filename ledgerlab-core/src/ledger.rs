//! Append-only trade log with derived cash and cost-basis state.
//!
//! The cash history is seeded with the initial cash and grows by exactly one
//! balance per appended trade. Cost basis is never updated incrementally: it
//! is re-derived from the instrument's full trade history each time that
//! instrument trades, because a position that goes flat and reopens resets
//! the weighting window.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::callback::Holding;
use crate::domain::{is_flat_quantity, CostBasis, Trade};

/// Ordered, append-only record of executed trades.
#[derive(Debug, Clone)]
pub struct Ledger {
    initial_cash: f64,
    trades: Vec<Trade>,
    cash: Vec<f64>,
    cost_basis: BTreeMap<String, CostBasis>,
}

/// One ledger row in its tabular export shape.
///
/// Field names are the column names of the exported table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerRow {
    pub datetime: NaiveDate,
    pub code: String,
    pub price: f64,
    pub amount: f64,
    pub cash: f64,
    pub commission: f64,
    pub tax: f64,
    pub total: f64,
    pub direction: i8,
}

impl From<&Trade> for LedgerRow {
    fn from(trade: &Trade) -> Self {
        Self {
            datetime: trade.date,
            code: trade.code.clone(),
            price: trade.price,
            amount: trade.signed_amount,
            cash: trade.cash_after,
            commission: trade.commission,
            tax: trade.tax,
            total: trade.total_value,
            direction: trade.direction.sign(),
        }
    }
}

impl Ledger {
    pub fn new(initial_cash: f64) -> Self {
        Self {
            initial_cash,
            trades: Vec::new(),
            cash: vec![initial_cash],
            cost_basis: BTreeMap::new(),
        }
    }

    /// Append an executed trade.
    ///
    /// Its `cash_after` becomes the new available cash and the cost basis of
    /// its code is rebuilt from history.
    pub fn append(&mut self, trade: Trade) {
        self.cash.push(trade.cash_after);
        let code = trade.code.clone();
        self.trades.push(trade);
        self.refresh_cost_basis(&code);
    }

    fn refresh_cost_basis(&mut self, code: &str) {
        let basis = reconstruct_cost_basis(self.trades.iter().filter(|t| t.code == code));
        trace!(code, ?basis, "cost basis rebuilt");
        match basis {
            Some(basis) => {
                self.cost_basis.insert(code.to_string(), basis);
            }
            None => {
                self.cost_basis.remove(code);
            }
        }
    }

    pub fn initial_cash(&self) -> f64 {
        self.initial_cash
    }

    /// Latest cash balance.
    pub fn available_cash(&self) -> f64 {
        self.cash.last().copied().unwrap_or(self.initial_cash)
    }

    /// All cash balances, starting with the initial cash.
    pub fn cash_history(&self) -> &[f64] {
        &self.cash
    }

    /// Trades in the order they were executed.
    pub fn trades(&self) -> &[Trade] {
        &self.trades
    }

    pub fn len(&self) -> usize {
        self.trades.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trades.is_empty()
    }

    /// Trades ordered by date. Same-date trades keep execution order.
    pub fn trades_by_date(&self) -> Vec<&Trade> {
        let mut sorted: Vec<&Trade> = self.trades.iter().collect();
        sorted.sort_by_key(|t| t.date);
        sorted
    }

    /// Tabular rows ordered by date.
    pub fn rows(&self) -> Vec<LedgerRow> {
        self.trades_by_date().into_iter().map(LedgerRow::from).collect()
    }

    /// Cost basis of an open position, `None` if flat or never traded.
    pub fn cost_basis(&self, code: &str) -> Option<CostBasis> {
        self.cost_basis.get(code).copied()
    }

    /// Cost basis of every open position, sorted by code.
    pub fn cost_bases(&self) -> &BTreeMap<String, CostBasis> {
        &self.cost_basis
    }

    /// Holding view handed to callbacks.
    pub fn holding(&self, code: &str) -> Holding {
        Holding::from(self.cost_basis(code))
    }

    /// Available cash plus every open position at its cost basis.
    pub fn total_assets(&self) -> f64 {
        let book: f64 = self.cost_basis.values().map(CostBasis::book_value).sum();
        self.available_cash() + book
    }

    pub fn total_commission(&self) -> f64 {
        self.trades.iter().map(|t| t.commission).sum()
    }

    pub fn total_tax(&self) -> f64 {
        self.trades.iter().map(|t| t.tax).sum()
    }

    /// Net signed amount per code across all trades, flat codes dropped.
    ///
    /// Unlike [`cost_bases`](Self::cost_bases) this is a plain sum and does
    /// not look for flat points.
    pub fn open_positions(&self) -> BTreeMap<String, f64> {
        let mut net: BTreeMap<String, f64> = BTreeMap::new();
        for trade in &self.trades {
            *net.entry(trade.code.clone()).or_insert(0.0) += trade.signed_amount;
        }
        net.retain(|_, amount| !is_flat_quantity(*amount));
        net
    }

    /// Days each open position has been held, measured from its latest trade.
    ///
    /// Only trades dated on or before `cutoff` are considered (all trades when
    /// `cutoff` is `None`). Codes whose net amount over those trades is zero
    /// are left out. The result is `as_of - latest_trade_date` in days.
    pub fn holding_periods(
        &self,
        as_of: NaiveDate,
        cutoff: Option<NaiveDate>,
    ) -> BTreeMap<String, i64> {
        let mut by_code: BTreeMap<&str, (f64, NaiveDate)> = BTreeMap::new();
        let considered = self
            .trades
            .iter()
            .filter(|t| cutoff.map_or(true, |limit| t.date <= limit));
        for trade in considered {
            let entry = by_code
                .entry(trade.code.as_str())
                .or_insert((0.0, trade.date));
            entry.0 += trade.signed_amount;
            entry.1 = entry.1.max(trade.date);
        }
        by_code
            .into_iter()
            .filter(|(_, (net, _))| !is_flat_quantity(*net))
            .map(|(code, (_, last))| (code.to_string(), (as_of - last).num_days()))
            .collect()
    }
}

/// Rebuild the cost basis of one instrument from its trades.
///
/// The trades are ordered by date (stable). The most recent flat point is the
/// largest prefix whose signed amounts sum to zero (within
/// [`QUANTITY_EPSILON`](crate::domain::QUANTITY_EPSILON)); the empty prefix
/// always qualifies. Only the trades after that point are weighted:
///
/// - `open_quantity = Σ signed_amount`
/// - `avg_cost = Σ (price × signed_amount) / open_quantity`
///
/// Returns `None` when the remaining trades net to zero.
pub fn reconstruct_cost_basis<'a>(
    trades: impl IntoIterator<Item = &'a Trade>,
) -> Option<CostBasis> {
    let mut history: Vec<&Trade> = trades.into_iter().collect();
    history.sort_by_key(|t| t.date);

    let mut prefix = Vec::with_capacity(history.len() + 1);
    let mut running = 0.0;
    prefix.push(running);
    for trade in &history {
        running += trade.signed_amount;
        prefix.push(running);
    }

    let flat_point = (0..prefix.len())
        .rev()
        .find(|&k| is_flat_quantity(prefix[k]))
        .unwrap_or(0);
    let open = &history[flat_point..];

    let open_quantity: f64 = open.iter().map(|t| t.signed_amount).sum();
    if is_flat_quantity(open_quantity) {
        return None;
    }
    let weighted: f64 = open.iter().map(|t| t.price * t.signed_amount).sum();
    Some(CostBasis {
        avg_cost: weighted / open_quantity,
        open_quantity,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Direction;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn trade(date: NaiveDate, code: &str, price: f64, amount: f64, direction: Direction) -> Trade {
        Trade::new(date, code, price, amount, 0.0, 0.0, 0.0, direction)
    }

    #[test]
    fn no_trades_no_basis() {
        assert_eq!(reconstruct_cost_basis(std::iter::empty()), None);
    }

    #[test]
    fn single_buy_basis() {
        let trades = [trade(d(2024, 1, 2), "A", 10.0, 100.0, Direction::Buy)];
        let basis = reconstruct_cost_basis(&trades).unwrap();
        assert_eq!(basis.avg_cost, 10.0);
        assert_eq!(basis.open_quantity, 100.0);
    }

    #[test]
    fn weighted_average_of_buys() {
        let trades = [
            trade(d(2024, 1, 2), "A", 10.0, 100.0, Direction::Buy),
            trade(d(2024, 1, 3), "A", 13.0, 200.0, Direction::Buy),
        ];
        let basis = reconstruct_cost_basis(&trades).unwrap();
        assert!((basis.avg_cost - 12.0).abs() < 1e-12);
        assert_eq!(basis.open_quantity, 300.0);
    }

    #[test]
    fn flat_position_has_no_basis() {
        let trades = [
            trade(d(2024, 1, 2), "A", 10.0, 100.0, Direction::Buy),
            trade(d(2024, 1, 3), "A", 12.0, 100.0, Direction::Sell),
        ];
        assert_eq!(reconstruct_cost_basis(&trades), None);
    }

    #[test]
    fn reopened_position_ignores_trades_before_flat_point() {
        let trades = [
            trade(d(1998, 1, 1), "A", 4.5, 100.0, Direction::Buy),
            trade(d(1999, 1, 1), "A", 7.9, 100.0, Direction::Sell),
            trade(d(2000, 1, 1), "A", 6.7, 100.0, Direction::Buy),
        ];
        let basis = reconstruct_cost_basis(&trades).unwrap();
        assert_eq!(basis.avg_cost, 6.7);
        assert_eq!(basis.open_quantity, 100.0);
    }

    #[test]
    fn partial_sell_uses_signed_weights() {
        // Suffix since the last flat point is [+200 @ 10, -100 @ 16]:
        // (2000 - 1600) / 100 = 4
        let trades = [
            trade(d(2024, 1, 2), "A", 10.0, 200.0, Direction::Buy),
            trade(d(2024, 1, 3), "A", 16.0, 100.0, Direction::Sell),
        ];
        let basis = reconstruct_cost_basis(&trades).unwrap();
        assert!((basis.avg_cost - 4.0).abs() < 1e-12);
        assert_eq!(basis.open_quantity, 100.0);
    }

    #[test]
    fn latest_flat_point_wins_over_earlier_ones() {
        let trades = [
            trade(d(2024, 1, 1), "A", 5.0, 100.0, Direction::Buy),
            trade(d(2024, 1, 2), "A", 6.0, 100.0, Direction::Sell),
            trade(d(2024, 1, 3), "A", 7.0, 200.0, Direction::Buy),
            trade(d(2024, 1, 4), "A", 8.0, 200.0, Direction::Sell),
            trade(d(2024, 1, 5), "A", 9.0, 300.0, Direction::Buy),
            trade(d(2024, 1, 6), "A", 12.0, 300.0, Direction::Buy),
        ];
        let basis = reconstruct_cost_basis(&trades).unwrap();
        assert!((basis.avg_cost - 10.5).abs() < 1e-12);
        assert_eq!(basis.open_quantity, 600.0);
    }

    #[test]
    fn fractional_lots_that_net_out_are_flat() {
        let mut trades: Vec<Trade> = (1..=3)
            .map(|day| trade(d(2024, 1, day), "A", 10.0 + f64::from(day), 0.1, Direction::Buy))
            .collect();
        trades.extend(
            (4..=6).map(|day| trade(d(2024, 1, day), "A", 12.0, 0.1, Direction::Sell)),
        );
        assert_eq!(reconstruct_cost_basis(&trades), None);

        trades.push(trade(d(2024, 1, 7), "A", 15.0, 0.1, Direction::Buy));
        let basis = reconstruct_cost_basis(&trades).unwrap();
        assert!((basis.avg_cost - 15.0).abs() < 1e-9);
        assert!((basis.open_quantity - 0.1).abs() < 1e-12);
    }

    #[test]
    fn trades_are_ordered_by_date_before_scanning() {
        // Given out of order: the sell is dated last, so the position is flat.
        let trades = [
            trade(d(2024, 1, 3), "A", 12.0, 100.0, Direction::Sell),
            trade(d(2024, 1, 2), "A", 10.0, 100.0, Direction::Buy),
        ];
        assert_eq!(reconstruct_cost_basis(&trades), None);
    }

    #[test]
    fn short_position_basis() {
        let trades = [trade(d(2024, 1, 2), "A", 10.0, 100.0, Direction::Sell)];
        let basis = reconstruct_cost_basis(&trades).unwrap();
        assert_eq!(basis.avg_cost, 10.0);
        assert_eq!(basis.open_quantity, -100.0);
    }

    #[test]
    fn append_tracks_cash_and_basis() {
        let mut ledger = Ledger::new(1000.0);
        assert_eq!(ledger.available_cash(), 1000.0);
        assert_eq!(ledger.cash_history(), &[1000.0]);

        ledger.append(Trade::new(
            d(1998, 1, 1),
            "000001",
            4.5,
            100.0,
            544.55,
            5.0,
            0.45,
            Direction::Buy,
        ));
        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger.cash_history().len(), 2);
        assert_eq!(ledger.available_cash(), 544.55);
        assert_eq!(ledger.holding("000001").quantity, 100.0);
        assert_eq!(ledger.holding("000002"), Holding::default());

        ledger.append(Trade::new(
            d(1999, 1, 1),
            "000001",
            7.9,
            100.0,
            1328.76,
            5.0,
            0.79,
            Direction::Sell,
        ));
        assert!(ledger.cost_basis("000001").is_none());
        assert!(ledger.cost_bases().is_empty());
        assert_eq!(ledger.total_assets(), 1328.76);
        assert!((ledger.total_commission() - 10.0).abs() < 1e-12);
        assert!((ledger.total_tax() - 1.24).abs() < 1e-12);
    }

    #[test]
    fn basis_is_kept_per_code() {
        let mut ledger = Ledger::new(10_000.0);
        ledger.append(trade(d(2024, 1, 2), "A", 10.0, 100.0, Direction::Buy));
        ledger.append(trade(d(2024, 1, 2), "B", 20.0, 100.0, Direction::Buy));
        ledger.append(trade(d(2024, 1, 3), "A", 11.0, 100.0, Direction::Sell));
        assert!(ledger.cost_basis("A").is_none());
        assert_eq!(ledger.cost_basis("B").unwrap().avg_cost, 20.0);
    }

    #[test]
    fn rows_are_sorted_by_date_and_signed() {
        let mut ledger = Ledger::new(10_000.0);
        ledger.append(trade(d(2024, 1, 3), "A", 11.0, 100.0, Direction::Sell));
        ledger.append(trade(d(2024, 1, 2), "A", 10.0, 100.0, Direction::Buy));
        let rows = ledger.rows();
        assert_eq!(rows[0].datetime, d(2024, 1, 2));
        assert_eq!(rows[0].direction, 1);
        assert_eq!(rows[1].amount, -100.0);
        assert_eq!(rows[1].direction, -1);
        // Execution order is untouched.
        assert_eq!(ledger.trades()[0].date, d(2024, 1, 3));
    }

    #[test]
    fn open_positions_drop_flat_codes() {
        let mut ledger = Ledger::new(10_000.0);
        ledger.append(trade(d(2024, 1, 2), "A", 10.0, 100.0, Direction::Buy));
        ledger.append(trade(d(2024, 1, 2), "B", 20.0, 300.0, Direction::Buy));
        ledger.append(trade(d(2024, 1, 3), "A", 11.0, 100.0, Direction::Sell));
        ledger.append(trade(d(2024, 1, 4), "B", 21.0, 100.0, Direction::Sell));
        let open = ledger.open_positions();
        assert_eq!(open.len(), 1);
        assert_eq!(open["B"], 200.0);
    }

    #[test]
    fn holding_periods_measure_from_latest_trade() {
        let mut ledger = Ledger::new(10_000.0);
        ledger.append(trade(d(2024, 1, 2), "A", 10.0, 100.0, Direction::Buy));
        ledger.append(trade(d(2024, 1, 5), "A", 10.0, 100.0, Direction::Buy));
        ledger.append(trade(d(2024, 1, 3), "B", 20.0, 100.0, Direction::Buy));
        ledger.append(trade(d(2024, 1, 8), "B", 21.0, 100.0, Direction::Sell));

        let periods = ledger.holding_periods(d(2024, 1, 10), None);
        assert_eq!(periods.len(), 1);
        assert_eq!(periods["A"], 5);

        // Before B's sell, B was still open.
        let periods = ledger.holding_periods(d(2024, 1, 10), Some(d(2024, 1, 4)));
        assert_eq!(periods["A"], 8);
        assert_eq!(periods["B"], 7);
    }
}
