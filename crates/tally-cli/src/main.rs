//! Tally CLI - Personal finance reconciliation tool
//!
//! Usage:
//!   tally import --file bank.csv       Parse a CSV export into canonical records
//!   tally import --file bank.csv --submit   ...and submit through the service
//!   tally stats --file records.json    Compute totals over a record file
//!   tally convert --input r.jpg --output r.pdf   Render an image to PDF
//!   tally ingest --file doc.pdf --kind bank_statement   Extract transactions

mod cli;
mod commands;

#[cfg(test)]
mod tests;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    let config = tally_core::Config::load(&cli.config)?;

    match cli.command {
        Commands::Import { file, submit } => commands::cmd_import(&config, &file, submit).await,
        Commands::Stats { file } => commands::cmd_stats(&file),
        Commands::Convert { input, output } => commands::cmd_convert(&config, &input, &output).await,
        Commands::Ingest { file, kind } => commands::cmd_ingest(&config, &file, &kind).await,
    }
}
