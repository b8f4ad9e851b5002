//! CSV price table parsing.

use std::io::Read;
use std::path::Path;

use chrono::NaiveDate;
use tracing::debug;

use crate::domain::MarketObservation;
use crate::error::DataError;

/// Name of the required date column.
pub const DATE_COLUMN: &str = "date";
/// Name of the required instrument code column.
pub const CODE_COLUMN: &str = "code";

/// Read observations from any CSV source.
///
/// Dates must be `YYYY-MM-DD`. Prices must parse as finite, positive numbers.
/// Codes are kept verbatim, so leading zeros survive (`000001`).
pub fn read_observations<R: Read>(
    reader: R,
    price_column: &str,
) -> Result<Vec<MarketObservation>, DataError> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let headers = rdr.headers()?.clone();
    let column = |name: &str| {
        headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| DataError::MissingColumn(name.to_string()))
    };
    let date_idx = column(DATE_COLUMN)?;
    let code_idx = column(CODE_COLUMN)?;
    let price_idx = column(price_column)?;

    let mut observations = Vec::new();
    for (i, record) in rdr.records().enumerate() {
        let record = record?;
        // 1-based data row number, header excluded
        let row = i + 1;
        let field = |idx: usize| record.get(idx).unwrap_or("");

        let raw_date = field(date_idx);
        let date = NaiveDate::parse_from_str(raw_date, "%Y-%m-%d").map_err(|_| {
            DataError::InvalidDate {
                row,
                value: raw_date.to_string(),
            }
        })?;

        let raw_price = field(price_idx);
        let price: f64 = raw_price.parse().map_err(|_| DataError::InvalidPrice {
            row,
            column: price_column.to_string(),
            value: raw_price.to_string(),
        })?;

        let obs = MarketObservation::new(date, field(code_idx), price);
        if !obs.has_valid_price() {
            return Err(DataError::NonPositivePrice { row, price });
        }
        observations.push(obs);
    }

    debug!(rows = observations.len(), price_column, "observations loaded");
    Ok(observations)
}

/// Read observations from a CSV file on disk.
pub fn load_observations(
    path: &Path,
    price_column: &str,
) -> Result<Vec<MarketObservation>, DataError> {
    let file = std::fs::File::open(path)?;
    read_observations(file, price_column)
}
