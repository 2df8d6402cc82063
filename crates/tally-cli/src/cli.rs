//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI
//! arguments. The actual command implementations are in the `commands`
//! module.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Tally - Reconcile your money before the bank does
#[derive(Parser)]
#[command(name = "tally")]
#[command(about = "Personal finance reconciliation tool", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Config file path
    #[arg(long, default_value = "tally.toml", global = true)]
    pub config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Import transactions from a bank CSV export
    Import {
        /// CSV file to import
        #[arg(short, long)]
        file: PathBuf,

        /// Submit each record through the transaction service instead of
        /// printing the canonical JSON
        #[arg(long)]
        submit: bool,
    },

    /// Compute income/expense totals over a JSON record file
    Stats {
        /// JSON file containing an array of transaction records
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Convert a receipt image to a single-page PDF
    Convert {
        /// Input image (jpg, png, gif, webp)
        #[arg(short, long)]
        input: PathBuf,

        /// Output PDF path
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Upload a document to the ingestion service and merge the extracted
    /// transactions
    Ingest {
        /// Document to upload (image or PDF)
        #[arg(short, long)]
        file: PathBuf,

        /// Upload kind: receipt or bank_statement
        #[arg(short, long, default_value = "receipt")]
        kind: String,
    },
}
