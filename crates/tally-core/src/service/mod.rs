//! Transaction service boundary
//!
//! The reconciliation coordinator depends only on the `TransactionService`
//! trait, never on a transport. Implementations:
//!
//! - `HttpTransactionService`: JSON over HTTP against the REST backend
//! - `MockTransactionService`: in-memory fake for tests and development
//! - `TransactionClient`: concrete enum wrapper providing Clone +
//!   compile-time dispatch

mod http;
mod mock;

pub use http::HttpTransactionService;
pub use mock::MockTransactionService;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{ListFilters, RawTransactionInput, TransactionRecord};

/// Abstract contract of the external transaction service
///
/// Implementations must be Send + Sync to allow use across async tasks.
#[async_trait]
pub trait TransactionService: Send + Sync {
    /// Create a transaction; returns the authoritative record
    async fn create_transaction(&self, payload: &TransactionRecord) -> Result<TransactionRecord>;

    /// Patch an existing transaction by server id
    async fn update_transaction(
        &self,
        id: &str,
        patch: &RawTransactionInput,
    ) -> Result<TransactionRecord>;

    /// Delete a transaction by server id
    async fn delete_transaction(&self, id: &str) -> Result<()>;

    /// List transactions matching the given filters
    async fn list_transactions(&self, filters: &ListFilters) -> Result<Vec<TransactionRecord>>;
}

/// Concrete service client wrapper
///
/// Enum dispatch keeps the coordinator generic-free and Clone-able.
#[derive(Clone)]
pub enum TransactionClient {
    Http(HttpTransactionService),
    Mock(MockTransactionService),
}

impl TransactionClient {
    /// Create from environment variables
    ///
    /// `TALLY_API_URL` selects the HTTP backend; unset returns None.
    pub fn from_env() -> Option<Self> {
        let base_url = std::env::var("TALLY_API_URL").ok()?;
        Some(Self::Http(HttpTransactionService::new(&base_url)))
    }
}

#[async_trait]
impl TransactionService for TransactionClient {
    async fn create_transaction(&self, payload: &TransactionRecord) -> Result<TransactionRecord> {
        match self {
            Self::Http(s) => s.create_transaction(payload).await,
            Self::Mock(s) => s.create_transaction(payload).await,
        }
    }

    async fn update_transaction(
        &self,
        id: &str,
        patch: &RawTransactionInput,
    ) -> Result<TransactionRecord> {
        match self {
            Self::Http(s) => s.update_transaction(id, patch).await,
            Self::Mock(s) => s.update_transaction(id, patch).await,
        }
    }

    async fn delete_transaction(&self, id: &str) -> Result<()> {
        match self {
            Self::Http(s) => s.delete_transaction(id).await,
            Self::Mock(s) => s.delete_transaction(id).await,
        }
    }

    async fn list_transactions(&self, filters: &ListFilters) -> Result<Vec<TransactionRecord>> {
        match self {
            Self::Http(s) => s.list_transactions(filters).await,
            Self::Mock(s) => s.list_transactions(filters).await,
        }
    }
}
