//! Run fingerprint: a BLAKE3 hash over everything that decides the outcome.

use ledgerlab_core::MarketObservation;

use crate::config::BacktestConfig;

/// Hex-encoded BLAKE3 hash of the config and the input rows.
///
/// The data path is left out, so the same table under a different file name
/// gives the same fingerprint.
pub fn run_fingerprint(
    config: &BacktestConfig,
    observations: &[MarketObservation],
) -> Result<String, serde_json::Error> {
    let mut keyed = config.clone();
    keyed.backtest.data = None;

    let mut hasher = blake3::Hasher::new();
    hasher.update(&serde_json::to_vec(&keyed)?);
    for observation in observations {
        hasher.update(&serde_json::to_vec(observation)?);
    }
    Ok(hasher.finalize().to_hex().to_string())
}
