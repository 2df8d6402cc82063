//! Statistics command

use std::path::Path;

use anyhow::{Context, Result};
use tally_core::{stats, validate, RawTransactionInput, TransactionRecord};

use super::core::print_stats;

/// Compute totals over a JSON file of transaction records
///
/// The file is an array of raw records (any of the shapes the validator
/// accepts); totals are computed the same way the live engine computes them.
pub fn cmd_stats(file: &Path) -> Result<()> {
    let text = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let inputs: Vec<RawTransactionInput> =
        serde_json::from_str(&text).context("Expected a JSON array of transaction records")?;

    let records: Vec<TransactionRecord> = inputs.iter().map(validate).collect();
    let stats = stats::compute(&records, &[]);

    println!("Statistics for {} records:", records.len());
    print_stats(&stats);
    Ok(())
}
