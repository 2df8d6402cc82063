//! CLI command tests
//!
//! This module contains all tests for the CLI commands.

use std::io::Write;

use clap::Parser;
use tempfile::NamedTempFile;

use crate::cli::{Cli, Commands};
use crate::commands;

// ========== Argument Parsing Tests ==========

#[test]
fn test_parse_import() {
    let cli = Cli::try_parse_from(["tally", "import", "--file", "bank.csv", "--submit"]).unwrap();
    match cli.command {
        Commands::Import { file, submit } => {
            assert_eq!(file.to_str(), Some("bank.csv"));
            assert!(submit);
        }
        _ => panic!("expected import command"),
    }
}

#[test]
fn test_parse_ingest_default_kind() {
    let cli = Cli::try_parse_from(["tally", "ingest", "--file", "doc.pdf"]).unwrap();
    match cli.command {
        Commands::Ingest { kind, .. } => assert_eq!(kind, "receipt"),
        _ => panic!("expected ingest command"),
    }
}

#[test]
fn test_parse_global_flags() {
    let cli = Cli::try_parse_from([
        "tally", "--config", "custom.toml", "--verbose", "stats", "--file", "r.json",
    ])
    .unwrap();
    assert!(cli.verbose);
    assert_eq!(cli.config.to_str(), Some("custom.toml"));
}

#[test]
fn test_parse_rejects_unknown_command() {
    assert!(Cli::try_parse_from(["tally", "frobnicate"]).is_err());
}

// ========== Command Tests ==========

#[test]
fn test_cmd_stats_over_record_file() {
    let mut file = NamedTempFile::new().unwrap();
    write!(
        file,
        r#"[
            {{"amount": 1000, "type": "income", "category": "Salary"}},
            {{"amount": "₹250.00", "type": "expense", "category": "Food"}}
        ]"#
    )
    .unwrap();

    let result = commands::cmd_stats(file.path());
    assert!(result.is_ok());
}

#[test]
fn test_cmd_stats_rejects_non_array() {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{{\"amount\": 1}}").unwrap();
    assert!(commands::cmd_stats(file.path()).is_err());
}

#[tokio::test]
async fn test_cmd_import_prints_canonical_records() {
    let mut file = NamedTempFile::new().unwrap();
    write!(
        file,
        "Date,Description,Amount,Type,Category\n15/03/2024,NETFLIX.COM,15.99,expense,Entertainment\n"
    )
    .unwrap();

    let config = tally_core::Config::default();
    let result = commands::cmd_import(&config, file.path(), false).await;
    assert!(result.is_ok());
}

#[tokio::test]
async fn test_cmd_import_missing_file() {
    let config = tally_core::Config::default();
    let result = commands::cmd_import(&config, std::path::Path::new("/nonexistent.csv"), false).await;
    assert!(result.is_err());
}
