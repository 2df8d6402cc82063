//! CSV import command

use std::fs::File;
use std::path::Path;

use anyhow::{Context, Result};
use tally_core::{import::parse_csv, validate, Config, TransactionRecord};

use super::core::{open_coordinator, print_stats};

/// Import a bank CSV export
///
/// Without `--submit`, prints the canonical records as JSON. With it, each
/// record goes through the reconciliation coordinator against the configured
/// transaction service; failures are reported per row and do not stop the
/// run.
pub async fn cmd_import(config: &Config, file: &Path, submit: bool) -> Result<()> {
    let reader = File::open(file).with_context(|| format!("Failed to open {}", file.display()))?;
    let inputs = parse_csv(reader).context("Failed to parse CSV")?;
    println!("Parsed {} rows from {}", inputs.len(), file.display());

    if !submit {
        let records: Vec<TransactionRecord> = inputs.iter().map(validate).collect();
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(());
    }

    let mut coordinator = open_coordinator(config);
    let mut created = 0usize;
    let mut failed = 0usize;

    for (row, input) in inputs.into_iter().enumerate() {
        match coordinator.create(input).await {
            Ok(result) => {
                created += 1;
                let id = result.record.id.as_deref().unwrap_or("?");
                println!("  ✓ row {} -> {}", row + 1, id);
            }
            Err(err) => {
                failed += 1;
                tracing::debug!("row {} failed: {}", row + 1, err);
                println!("  ✗ row {}: {}", row + 1, err);
            }
        }
    }

    println!("\nImported {} transactions ({} failed)", created, failed);
    if !coordinator.awaiting_retry().is_empty() {
        println!(
            "{} entries held for retry: {}",
            coordinator.awaiting_retry().len(),
            coordinator.awaiting_retry().join(", ")
        );
    }
    print_stats(&coordinator.stats());
    Ok(())
}
