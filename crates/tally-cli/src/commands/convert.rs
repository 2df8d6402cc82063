//! Image-to-PDF conversion command

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use tally_core::{Config, DocumentConverter};

/// Convert a receipt image into a single-page PDF
pub async fn cmd_convert(config: &Config, input: &Path, output: &Path) -> Result<()> {
    let converter = DocumentConverter::new(
        &config.converter.renderer,
        Duration::from_secs(config.converter.timeout_secs),
    );

    converter
        .image_to_pdf(input, output)
        .await
        .with_context(|| format!("Failed to convert {}", input.display()))?;

    println!("Wrote {}", output.display());
    Ok(())
}
