//! Artifact export: JSON, CSV and the text report.
//!
//! A saved run directory holds:
//! - `report.txt`: the rendered text report
//! - `ledger.csv`: one row per trade, ordered by date
//! - `ledger.json`: the same rows as a JSON array
//! - `summary.json`: the full [`BacktestResult`] with schema version

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use ledgerlab_core::ledger::LedgerRow;
use tracing::info;

use crate::runner::{BacktestResult, SCHEMA_VERSION};

/// Column order of the ledger table.
pub const LEDGER_COLUMNS: [&str; 9] = [
    "datetime",
    "code",
    "price",
    "amount",
    "cash",
    "commission",
    "tax",
    "total",
    "direction",
];

/// Serialize a result to pretty JSON.
pub fn export_json(result: &BacktestResult) -> Result<String> {
    serde_json::to_string_pretty(result).context("failed to serialize BacktestResult to JSON")
}

/// Deserialize a result, rejecting schema versions newer than this build.
pub fn import_json(json: &str) -> Result<BacktestResult> {
    let result: BacktestResult =
        serde_json::from_str(json).context("failed to deserialize BacktestResult from JSON")?;
    if result.schema_version > SCHEMA_VERSION {
        bail!(
            "unsupported schema version {} (max supported: {})",
            result.schema_version,
            SCHEMA_VERSION
        );
    }
    Ok(result)
}

/// Ledger rows as CSV. Currency columns carry two decimals.
pub fn export_ledger_csv(rows: &[LedgerRow]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(LEDGER_COLUMNS)?;

    for row in rows {
        wtr.write_record([
            &row.datetime.format("%Y-%m-%d").to_string(),
            &row.code,
            &row.price.to_string(),
            &row.amount.to_string(),
            &format!("{:.2}", row.cash),
            &format!("{:.2}", row.commission),
            &format!("{:.2}", row.tax),
            &format!("{:.2}", row.total),
            &row.direction.to_string(),
        ])?;
    }

    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// Ledger rows as a JSON array, full precision.
pub fn export_ledger_json(rows: &[LedgerRow]) -> Result<String> {
    serde_json::to_string_pretty(rows).context("failed to serialize ledger rows to JSON")
}

/// Write every artifact of a run into a new directory under `output_dir`.
///
/// The directory is named `<timestamp>_<fingerprint prefix>`. Returns its path.
pub fn save_artifacts(result: &BacktestResult, output_dir: &Path) -> Result<PathBuf> {
    let prefix = result.fingerprint.get(..12).unwrap_or(&result.fingerprint);
    let dirname = format!(
        "{}_{}",
        chrono::Local::now().format("%Y%m%d_%H%M%S"),
        prefix
    );
    let run_dir = output_dir.join(dirname);
    std::fs::create_dir_all(&run_dir)
        .with_context(|| format!("failed to create artifact dir: {}", run_dir.display()))?;

    write_artifact(&run_dir, "report.txt", &result.report)?;
    write_artifact(&run_dir, "ledger.csv", &export_ledger_csv(&result.ledger)?)?;
    write_artifact(&run_dir, "ledger.json", &export_ledger_json(&result.ledger)?)?;
    write_artifact(&run_dir, "summary.json", &export_json(result)?)?;

    info!(dir = %run_dir.display(), "artifacts saved");
    Ok(run_dir)
}

fn write_artifact(dir: &Path, name: &str, content: &str) -> Result<()> {
    let path = dir.join(name);
    std::fs::write(&path, content).with_context(|| format!("failed to write {}", path.display()))
}

/// Load a saved run back from its `summary.json`.
pub fn load_artifacts(dir: &Path) -> Result<BacktestResult> {
    let path = dir.join("summary.json");
    let json = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    import_json(&json)
}
