//! Document ingestion command

use std::path::Path;

use anyhow::{anyhow, Context, Result};
use tally_core::{Config, HttpIngestionService, UploadKind};

use super::core::{open_coordinator, print_stats};

/// Upload a document and merge the extracted transactions
pub async fn cmd_ingest(config: &Config, file: &Path, kind: &str) -> Result<()> {
    let kind: UploadKind = kind.parse().map_err(|e: String| anyhow!(e))?;
    let data =
        std::fs::read(file).with_context(|| format!("Failed to read {}", file.display()))?;

    let service = HttpIngestionService::new(&config.ingestion.base_url);
    let mut coordinator = open_coordinator(config);

    let report = coordinator
        .ingest_document(&service, &data, kind)
        .await
        .context("Ingestion failed")?;

    println!(
        "Merged {} transactions ({} submitted through the service)",
        report.merged.len(),
        report.submitted
    );

    if report.queued_for_review > 0 {
        println!(
            "\n{} candidates need manual review:",
            report.queued_for_review
        );
        for (i, candidate) in coordinator.pending_review().iter().enumerate() {
            let amount = candidate
                .input
                .amount
                .as_ref()
                .map(|v| v.to_string())
                .unwrap_or_else(|| "?".to_string());
            let category = candidate.input.category.as_deref().unwrap_or("?");
            let confidence = candidate
                .confidence
                .map(|c| format!("{:.0}%", c * 100.0))
                .unwrap_or_else(|| "n/a".to_string());
            println!(
                "  #{} amount={} category={} confidence={}",
                i, amount, category, confidence
            );
        }
    }

    print_stats(&coordinator.stats());
    Ok(())
}
