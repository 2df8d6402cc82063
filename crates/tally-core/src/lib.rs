//! Tally Core Library
//!
//! Reconciliation engine for the Tally personal finance tool:
//! - Defensive amount/date normalization for untrusted payloads
//! - Single-point validation into canonical transaction records
//! - Optimistic ledger overlaying pending client-side transactions
//! - Real-time statistics recomputed after every mutation
//! - Reconciliation coordinator matching optimistic entries against
//!   authoritative service responses
//! - Transaction service and document ingestion service clients
//! - Image-to-PDF document converter backed by an external renderer
//! - CSV bulk import

pub mod config;
pub mod convert;
pub mod error;
pub mod import;
pub mod ingest;
pub mod ledger;
pub mod models;
pub mod normalize;
pub mod reconcile;
pub mod service;
pub mod stats;
pub mod validate;

/// Test utilities including the mock transaction service server
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use config::{Config, ConverterConfig, IngestionConfig, ReconcileConfig, ServiceConfig};
pub use convert::DocumentConverter;
pub use error::{Error, Result};
pub use ingest::{
    CandidateTransaction, DocumentIngestionService, HttpIngestionService, IngestionClient,
    MockIngestionService, UploadKind,
};
pub use ledger::{LedgerEntry, OptimisticLedger};
pub use models::{
    ListFilters, RawTransactionInput, Stats, TransactionKind, TransactionRecord, TransactionSource,
};
pub use reconcile::{
    Coordinator, CoordinatorOptions, CreateResult, IngestReport, ReconcileOutcome, RevertPolicy,
    AMOUNT_EPSILON,
};
pub use service::{
    HttpTransactionService, MockTransactionService, TransactionClient, TransactionService,
};
pub use validate::{merge_and_validate, validate, DEFAULT_CATEGORY};
