//! Reporter: read-only summary of a finished simulation.
//!
//! The text layout is consumed by existing tooling: currency values carry two
//! decimals and ratios are printed as percentages with two decimals.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::CostBasis;
use crate::engine::BacktestEngine;
use crate::ledger::Ledger;

/// Returned by [`render_report`] before the simulation has run.
pub const NOT_COMPUTED_MESSAGE: &str =
    "Not computed yet. Call `BacktestEngine::run` before requesting a report.";

/// Aggregate statistics derived from the engine input and the ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportSummary {
    /// Date of the first input row.
    pub start_date: Option<NaiveDate>,
    /// Date of the last input row.
    pub end_date: Option<NaiveDate>,
    /// Number of distinct dates in the input.
    pub trading_days: usize,
    pub initial_cash: f64,
    pub trade_count: usize,
    pub available_cash: f64,
    pub holdings: BTreeMap<String, CostBasis>,
    pub total_assets: f64,
    /// `available_cash / initial_cash`
    pub cash_change_ratio: f64,
    /// `total_assets / initial_cash`
    pub asset_change_ratio: f64,
    pub total_commission: f64,
    pub total_tax: f64,
}

impl ReportSummary {
    /// `None` until the engine has run.
    pub fn from_engine(engine: &BacktestEngine) -> Option<Self> {
        if !engine.is_computed() {
            return None;
        }
        let observations = engine.observations();
        let ledger = engine.ledger();
        let trading_days = observations
            .iter()
            .map(|o| o.date)
            .collect::<BTreeSet<_>>()
            .len();
        let initial_cash = ledger.initial_cash();
        let total_assets = ledger.total_assets();

        Some(Self {
            start_date: observations.first().map(|o| o.date),
            end_date: observations.last().map(|o| o.date),
            trading_days,
            initial_cash,
            trade_count: ledger.len(),
            available_cash: ledger.available_cash(),
            holdings: ledger.cost_bases().clone(),
            total_assets,
            cash_change_ratio: ratio(ledger.available_cash(), initial_cash),
            asset_change_ratio: ratio(total_assets, initial_cash),
            total_commission: ledger.total_commission(),
            total_tax: ledger.total_tax(),
        })
    }
}

fn ratio(value: f64, base: f64) -> f64 {
    if base == 0.0 {
        0.0
    } else {
        value / base
    }
}

/// Render the multi-line text report for an engine.
///
/// Calling this twice without running again gives identical output.
pub fn render_report(engine: &BacktestEngine) -> String {
    match ReportSummary::from_engine(engine) {
        Some(summary) => render_summary(&summary, engine.ledger()),
        None => NOT_COMPUTED_MESSAGE.to_string(),
    }
}

fn render_summary(summary: &ReportSummary, ledger: &Ledger) -> String {
    let fmt_date = |date: Option<NaiveDate>| {
        date.map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "-".to_string())
    };

    let mut lines = vec![
        format!(
            "Data range: {}~{} (tradable days: {})",
            fmt_date(summary.start_date),
            fmt_date(summary.end_date),
            summary.trading_days
        ),
        format!("Initial cash: {:.2}", summary.initial_cash),
        format!(
            "Trades: {} (buys and sells count once each)",
            summary.trade_count
        ),
        format!("Available cash: {:.2}", summary.available_cash),
    ];

    if summary.holdings.is_empty() {
        lines.push("Holdings: none".to_string());
    } else {
        lines.push("Holdings:".to_string());
        lines.push(holdings_table(&summary.holdings));
    }

    lines.push(format!("Total assets: {:.2}", summary.total_assets));
    lines.push(format!(
        "Cash change: {:.2}%",
        summary.cash_change_ratio * 100.0
    ));
    lines.push(format!(
        "Asset change: {:.2}%",
        summary.asset_change_ratio * 100.0
    ));
    lines.push(format!("Total commission: {:.2}", summary.total_commission));
    lines.push(format!("Total tax: {:.2}", summary.total_tax));
    lines.push("Ledger:".to_string());
    lines.push(ledger_table(ledger));

    lines.join("\n")
}

/// Holdings block: one row per open position.
pub fn holdings_table(holdings: &BTreeMap<String, CostBasis>) -> String {
    let rows: Vec<Vec<String>> = holdings
        .iter()
        .map(|(code, basis)| {
            vec![
                code.clone(),
                format!("{:.2}", basis.avg_cost),
                basis.open_quantity.to_string(),
            ]
        })
        .collect();
    render_table(&["code", "avg_cost", "quantity"], &rows, false)
}

/// Full ledger ordered by date, with a leading row index.
pub fn ledger_table(ledger: &Ledger) -> String {
    let rows: Vec<Vec<String>> = ledger
        .rows()
        .into_iter()
        .map(|row| {
            vec![
                row.datetime.format("%Y-%m-%d").to_string(),
                row.code,
                row.price.to_string(),
                row.amount.to_string(),
                format!("{:.2}", row.cash),
                format!("{:.2}", row.commission),
                format!("{:.2}", row.tax),
                format!("{:.2}", row.total),
                row.direction.to_string(),
            ]
        })
        .collect();
    render_table(
        &[
            "datetime",
            "code",
            "price",
            "amount",
            "cash",
            "commission",
            "tax",
            "total",
            "direction",
        ],
        &rows,
        true,
    )
}

/// Right-aligned fixed-width table, columns separated by two spaces.
fn render_table(headers: &[&str], rows: &[Vec<String>], with_index: bool) -> String {
    let mut columns: Vec<Vec<String>> = Vec::with_capacity(headers.len() + 1);
    if with_index {
        let mut index = vec![String::new()];
        index.extend((0..rows.len()).map(|i| i.to_string()));
        columns.push(index);
    }
    for (c, header) in headers.iter().enumerate() {
        let mut column = vec![header.to_string()];
        column.extend(rows.iter().map(|row| row[c].clone()));
        columns.push(column);
    }

    let widths: Vec<usize> = columns
        .iter()
        .map(|col| col.iter().map(|cell| cell.chars().count()).max().unwrap_or(0))
        .collect();

    (0..=rows.len())
        .map(|r| {
            columns
                .iter()
                .zip(&widths)
                .map(|(col, &width)| format!("{:>width$}", col[r]))
                .collect::<Vec<_>>()
                .join("  ")
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::callback::CallbackChain;
    use crate::domain::MarketObservation;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn idle_engine() -> BacktestEngine {
        let obs = vec![
            MarketObservation::new(d(2024, 1, 2), "A", 10.0),
            MarketObservation::new(d(2024, 1, 2), "B", 20.0),
            MarketObservation::new(d(2024, 1, 3), "A", 11.0),
        ];
        BacktestEngine::with_callbacks(obs, CallbackChain::default()).unwrap()
    }

    #[test]
    fn placeholder_before_run() {
        let engine = idle_engine();
        assert_eq!(engine.report(), NOT_COMPUTED_MESSAGE);
        assert!(engine.summary().is_none());
    }

    #[test]
    fn idle_run_summary() {
        let mut engine = idle_engine();
        engine.run().unwrap();
        let summary = engine.summary().unwrap();
        assert_eq!(summary.start_date, Some(d(2024, 1, 2)));
        assert_eq!(summary.end_date, Some(d(2024, 1, 3)));
        assert_eq!(summary.trading_days, 2);
        assert_eq!(summary.trade_count, 0);
        assert_eq!(summary.total_assets, 10_000.0);
        assert_eq!(summary.cash_change_ratio, 1.0);

        let report = engine.report();
        assert!(report.starts_with("Data range: 2024-01-02~2024-01-03 (tradable days: 2)"));
        assert!(report.contains("Holdings: none"));
        assert!(report.contains("Cash change: 100.00%"));
    }

    #[test]
    fn empty_input_renders_dashes() {
        let mut engine =
            BacktestEngine::with_callbacks(Vec::new(), CallbackChain::default()).unwrap();
        engine.run().unwrap();
        assert!(engine.report().starts_with("Data range: -~- (tradable days: 0)"));
    }

    #[test]
    fn table_is_right_aligned() {
        let rows = vec![vec!["A".to_string(), "1.50".to_string()]];
        let table = render_table(&["code", "price"], &rows, true);
        assert_eq!(table, "   code  price\n0     A   1.50");
    }

    #[test]
    fn ratio_guards_zero_base() {
        assert_eq!(ratio(5.0, 0.0), 0.0);
        assert_eq!(ratio(5.0, 10.0), 0.5);
    }
}
