//! Mock transaction service for tests and development
//!
//! Assigns predictable `srv-N` ids and records every created payload.
//! Failure and response-delay switches cover the revert and timeout paths.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::error::{Error, Result};
use crate::models::{ListFilters, RawTransactionInput, TransactionRecord};
use crate::validate::merge_and_validate;

use super::TransactionService;

/// Mock transaction service
#[derive(Clone, Default)]
pub struct MockTransactionService {
    /// When set, every call fails with a service error
    fail: Arc<AtomicBool>,
    /// Artificial response latency (for timeout tests)
    delay: Option<Duration>,
    /// Added to every echoed amount (for epsilon-matching tests)
    amount_skew: f64,
    next_id: Arc<AtomicU64>,
    created: Arc<Mutex<Vec<TransactionRecord>>>,
}

impl MockTransactionService {
    pub fn new() -> Self {
        Self::default()
    }

    /// A mock that fails every call
    pub fn failing() -> Self {
        let service = Self::default();
        service.fail.store(true, Ordering::SeqCst);
        service
    }

    /// Add artificial latency to every call
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Skew every echoed amount by the given delta
    pub fn with_amount_skew(mut self, skew: f64) -> Self {
        self.amount_skew = skew;
        self
    }

    /// Toggle failure mode at runtime
    pub fn set_fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    /// Everything successfully created so far
    pub fn created(&self) -> Vec<TransactionRecord> {
        self.created.lock().unwrap().clone()
    }

    async fn simulate(&self) -> Result<()> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail.load(Ordering::SeqCst) {
            return Err(Error::Service("mock transaction service failure".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl TransactionService for MockTransactionService {
    async fn create_transaction(&self, payload: &TransactionRecord) -> Result<TransactionRecord> {
        self.simulate().await?;

        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let mut record = payload.clone();
        record.id = Some(format!("srv-{}", id));
        record.temp_id = None;
        record.is_optimistic = false;
        record.amount += self.amount_skew;

        self.created.lock().unwrap().push(record.clone());
        Ok(record)
    }

    async fn update_transaction(
        &self,
        id: &str,
        patch: &RawTransactionInput,
    ) -> Result<TransactionRecord> {
        self.simulate().await?;

        let mut created = self.created.lock().unwrap();
        let record = created
            .iter_mut()
            .find(|r| r.id.as_deref() == Some(id))
            .ok_or_else(|| Error::NotFound(format!("transaction {}", id)))?;
        *record = merge_and_validate(record, patch);
        Ok(record.clone())
    }

    async fn delete_transaction(&self, id: &str) -> Result<()> {
        self.simulate().await?;

        let mut created = self.created.lock().unwrap();
        let before = created.len();
        created.retain(|r| r.id.as_deref() != Some(id));
        if created.len() == before {
            return Err(Error::NotFound(format!("transaction {}", id)));
        }
        Ok(())
    }

    async fn list_transactions(&self, filters: &ListFilters) -> Result<Vec<TransactionRecord>> {
        self.simulate().await?;

        let created = self.created.lock().unwrap();
        let mut records: Vec<TransactionRecord> = created
            .iter()
            .filter(|r| filters.kind.map_or(true, |k| r.kind == k))
            .filter(|r| {
                filters
                    .category
                    .as_deref()
                    .map_or(true, |c| r.category == c)
            })
            .cloned()
            .collect();
        if let Some(limit) = filters.limit {
            records.truncate(limit.max(0) as usize);
        }
        Ok(records)
    }
}
