//! Reconciliation coordinator
//!
//! Owns the optimistic ledger, the confirmed collection, and the derived
//! statistics, and drives the per-create state machine:
//!
//! ```text
//! Pending -> Confirmed   (authoritative response matched + evicted)
//! Pending -> Reverted    (failure or timeout; discard or retain-for-retry)
//! ```
//!
//! External callers read `stats()` and the merged `records()` view; every
//! mutation goes through the coordinator and finishes with a synchronous
//! statistics recompute, so an observed snapshot always reflects all
//! acknowledged mutations.

use std::collections::HashSet;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::ingest::{CandidateTransaction, DocumentIngestionService, UploadKind};
use crate::ledger::OptimisticLedger;
use crate::models::{ListFilters, RawTransactionInput, Stats, TransactionRecord};
use crate::service::{TransactionClient, TransactionService};
use crate::stats;
use crate::validate::validate;

/// Two amounts within this distance count as the same money
pub const AMOUNT_EPSILON: f64 = 0.01;

/// What happens to an optimistic entry when its create call fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RevertPolicy {
    /// Remove the entry immediately
    Discard,
    /// Keep the entry for one user-initiated retry, then discard
    #[default]
    RetainForRetry,
}

impl RevertPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Discard => "discard",
            Self::RetainForRetry => "retain_for_retry",
        }
    }
}

impl std::str::FromStr for RevertPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "discard" => Ok(Self::Discard),
            "retain_for_retry" | "retain" => Ok(Self::RetainForRetry),
            _ => Err(format!("Unknown revert policy: {}", s)),
        }
    }
}

/// Coordinator tuning knobs
#[derive(Debug, Clone)]
pub struct CoordinatorOptions {
    /// Bound on every service call; a timeout is treated as a failure
    pub request_timeout: Duration,
    pub revert_policy: RevertPolicy,
    /// Optimistic entries older than this are garbage-collected by
    /// `sweep_stale` (covers confirmations that never matched)
    pub stale_after: Duration,
}

impl Default for CoordinatorOptions {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(10),
            revert_policy: RevertPolicy::default(),
            stale_after: Duration::from_secs(120),
        }
    }
}

/// How an authoritative record reconciled against the optimistic ledger
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// Matched and evicted this optimistic entry
    Matched { temp_id: String },
    /// No candidate qualified; the record was accepted anyway and any stale
    /// optimistic twin is left for the TTL sweep
    Unmatched,
}

/// Result of a successful optimistic create
#[derive(Debug, Clone)]
pub struct CreateResult {
    /// The authoritative record as confirmed by the service
    pub record: TransactionRecord,
    pub outcome: ReconcileOutcome,
}

/// Result of merging a batch of ingestion candidates
#[derive(Debug, Clone, Default)]
pub struct IngestReport {
    /// Records merged into confirmed state
    pub merged: Vec<TransactionRecord>,
    /// Candidates parked in the manual-review queue
    pub queued_for_review: usize,
    /// Id-less candidates that were submitted through the transaction service
    pub submitted: usize,
}

/// The reconciliation coordinator
///
/// An explicit, constructible state object - one per client session - rather
/// than a module-level global. The `&mut self` receiver on every mutating
/// operation is the single-writer serialization the model requires.
pub struct Coordinator {
    client: TransactionClient,
    options: CoordinatorOptions,
    ledger: OptimisticLedger,
    confirmed: Vec<TransactionRecord>,
    stats: Stats,
    next_temp: u64,
    awaiting_retry: HashSet<String>,
    review_queue: Vec<CandidateTransaction>,
    seen_uploads: HashSet<String>,
}

impl Coordinator {
    pub fn new(client: TransactionClient, options: CoordinatorOptions) -> Self {
        Self {
            client,
            options,
            ledger: OptimisticLedger::new(),
            confirmed: Vec::new(),
            stats: Stats::default(),
            next_temp: 0,
            awaiting_retry: HashSet::new(),
            review_queue: Vec::new(),
            seen_uploads: HashSet::new(),
        }
    }

    pub fn with_defaults(client: TransactionClient) -> Self {
        Self::new(client, CoordinatorOptions::default())
    }

    // ========== Read-only views ==========

    /// Current statistics snapshot (confirmed + optimistic)
    pub fn stats(&self) -> Stats {
        self.stats
    }

    pub fn confirmed(&self) -> &[TransactionRecord] {
        &self.confirmed
    }

    /// Pending optimistic records in insertion order
    pub fn pending(&self) -> Vec<TransactionRecord> {
        self.ledger.list_all()
    }

    /// Merged view: confirmed records followed by optimistic overlays
    pub fn records(&self) -> Vec<TransactionRecord> {
        let mut all = self.confirmed.clone();
        all.extend(self.ledger.list_all());
        all
    }

    /// Temp ids currently held for a user-initiated retry
    pub fn awaiting_retry(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.awaiting_retry.iter().cloned().collect();
        ids.sort();
        ids
    }

    /// Ingestion candidates waiting for manual review
    pub fn pending_review(&self) -> &[CandidateTransaction] {
        &self.review_queue
    }

    // ========== Optimistic create lifecycle ==========

    /// Create a transaction optimistically
    ///
    /// The entry becomes visible (and counted in stats) before the service
    /// call is issued. On success the authoritative record is reconciled
    /// against the ledger; on failure or timeout the entry is reverted per
    /// the configured policy and the error is returned to the caller.
    pub async fn create(&mut self, raw: RawTransactionInput) -> Result<CreateResult> {
        let temp_id = self.fresh_temp_id();
        let payload = self.ledger.add(&temp_id, &raw)?.clone();
        self.recompute();
        debug!(%temp_id, amount = payload.amount, "optimistic create pending");

        match self.submit(&payload).await {
            Ok(authoritative) => {
                let outcome = self.reconcile_confirmed(authoritative.clone());
                Ok(CreateResult {
                    record: authoritative,
                    outcome,
                })
            }
            Err(err) => {
                self.revert(&temp_id);
                Err(err)
            }
        }
    }

    /// Retry a failed optimistic entry (retain-for-retry policy)
    ///
    /// A second failure discards the entry.
    pub async fn retry(&mut self, temp_id: &str) -> Result<CreateResult> {
        if !self.awaiting_retry.contains(temp_id) {
            return Err(Error::NotFound(format!(
                "no failed optimistic entry {}",
                temp_id
            )));
        }
        let payload = self
            .ledger
            .get(temp_id)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("optimistic entry {}", temp_id)))?;

        match self.submit(&payload).await {
            Ok(authoritative) => {
                self.awaiting_retry.remove(temp_id);
                let outcome = self.reconcile_confirmed(authoritative.clone());
                Ok(CreateResult {
                    record: authoritative,
                    outcome,
                })
            }
            Err(err) => {
                self.revert(temp_id);
                Err(err)
            }
        }
    }

    /// Issue the create call under the configured timeout
    ///
    /// A timeout (or cancellation surfacing as one) is indistinguishable
    /// from a failure response; no Pending entry outlives it.
    async fn submit(&self, payload: &TransactionRecord) -> Result<TransactionRecord> {
        match tokio::time::timeout(
            self.options.request_timeout,
            self.client.create_transaction(payload),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(Error::Service(format!(
                "create timed out after {:?}",
                self.options.request_timeout
            ))),
        }
    }

    /// Apply the revert policy to a failed entry and recompute
    fn revert(&mut self, temp_id: &str) {
        match self.options.revert_policy {
            RevertPolicy::Discard => {
                self.ledger.remove(temp_id);
                self.awaiting_retry.remove(temp_id);
            }
            RevertPolicy::RetainForRetry => {
                let attempts = self.ledger.record_failure(temp_id).unwrap_or(0);
                if attempts >= 2 {
                    self.ledger.remove(temp_id);
                    self.awaiting_retry.remove(temp_id);
                } else {
                    self.awaiting_retry.insert(temp_id.to_string());
                }
            }
        }
        self.recompute();
    }

    // ========== Reconciliation ==========

    /// Reconcile one authoritative record against the optimistic ledger
    pub fn reconcile_confirmed(&mut self, record: TransactionRecord) -> ReconcileOutcome {
        let record = Self::as_confirmed(record);
        let outcome = match self.find_match(&record) {
            Some(temp_id) => {
                // Removal is the claim: a later response in the same pass
                // cannot match this entry again.
                self.ledger.remove(&temp_id);
                self.awaiting_retry.remove(&temp_id);
                ReconcileOutcome::Matched { temp_id }
            }
            None => {
                warn!(
                    id = record.id.as_deref(),
                    amount = record.amount,
                    "confirmed record matched no optimistic entry"
                );
                ReconcileOutcome::Unmatched
            }
        };
        self.confirmed.push(record);
        self.recompute();
        outcome
    }

    /// Reconcile a batch of authoritative records in one pass
    pub fn reconcile_confirmed_batch(
        &mut self,
        records: Vec<TransactionRecord>,
    ) -> Vec<ReconcileOutcome> {
        records
            .into_iter()
            .map(|record| self.reconcile_confirmed(record))
            .collect()
    }

    /// Best-match rule: amount within epsilon AND kind AND category equal;
    /// ties go to the most-recently-added entry.
    fn find_match(&self, record: &TransactionRecord) -> Option<String> {
        self.ledger
            .entries()
            .into_iter()
            .filter(|entry| {
                (entry.record.amount - record.amount).abs() < AMOUNT_EPSILON
                    && entry.record.kind == record.kind
                    && entry.record.category == record.category
            })
            .max_by_key(|entry| entry.seq)
            .and_then(|entry| entry.record.temp_id.clone())
    }

    /// Strip any optimistic identity from a server-confirmed record
    fn as_confirmed(mut record: TransactionRecord) -> TransactionRecord {
        record.temp_id = None;
        record.is_optimistic = false;
        record
    }

    // ========== Confirmed-collection operations ==========

    /// Update a confirmed transaction through the service
    pub async fn update(
        &mut self,
        id: &str,
        patch: &RawTransactionInput,
    ) -> Result<TransactionRecord> {
        let updated = match tokio::time::timeout(
            self.options.request_timeout,
            self.client.update_transaction(id, patch),
        )
        .await
        {
            Ok(result) => result?,
            Err(_) => {
                return Err(Error::Service(format!(
                    "update timed out after {:?}",
                    self.options.request_timeout
                )))
            }
        };

        match self.confirmed.iter_mut().find(|r| r.id.as_deref() == Some(id)) {
            Some(existing) => *existing = updated.clone(),
            None => self.confirmed.push(updated.clone()),
        }
        self.recompute();
        Ok(updated)
    }

    /// Delete a confirmed transaction through the service
    pub async fn delete(&mut self, id: &str) -> Result<()> {
        match tokio::time::timeout(
            self.options.request_timeout,
            self.client.delete_transaction(id),
        )
        .await
        {
            Ok(result) => result?,
            Err(_) => {
                return Err(Error::Service(format!(
                    "delete timed out after {:?}",
                    self.options.request_timeout
                )))
            }
        }

        self.confirmed.retain(|r| r.id.as_deref() != Some(id));
        self.recompute();
        Ok(())
    }

    /// Replace the confirmed collection from the service
    pub async fn refresh(&mut self, filters: &ListFilters) -> Result<usize> {
        let records = match tokio::time::timeout(
            self.options.request_timeout,
            self.client.list_transactions(filters),
        )
        .await
        {
            Ok(result) => result?,
            Err(_) => {
                return Err(Error::Service(format!(
                    "list timed out after {:?}",
                    self.options.request_timeout
                )))
            }
        };

        self.confirmed = records.into_iter().map(Self::as_confirmed).collect();
        self.recompute();
        Ok(self.confirmed.len())
    }

    // ========== Document ingestion ==========

    /// Run an uploaded document through the ingestion service and merge the
    /// extracted candidates
    ///
    /// A repeated upload (same content hash) is rejected before the service
    /// is called.
    pub async fn ingest_document<S: DocumentIngestionService>(
        &mut self,
        service: &S,
        data: &[u8],
        kind: UploadKind,
    ) -> Result<IngestReport> {
        let digest = hex::encode(Sha256::digest(data));
        if self.seen_uploads.contains(&digest) {
            return Err(Error::DuplicateUpload(digest));
        }

        let candidates = match tokio::time::timeout(
            self.options.request_timeout,
            service.submit_document(data, kind),
        )
        .await
        {
            Ok(Ok(candidates)) => candidates,
            Ok(Err(err)) => return Err(err),
            Err(_) => {
                return Err(Error::Service(format!(
                    "ingestion timed out after {:?}",
                    self.options.request_timeout
                )))
            }
        };

        self.seen_uploads.insert(digest);
        self.ingest_candidates(candidates).await
    }

    /// Merge extracted candidates into confirmed state
    ///
    /// The ingestion call has already completed, so candidates bypass the
    /// optimistic phase: id-bearing candidates merge as-is, id-less ones are
    /// submitted through the transaction service first. Low-confidence
    /// candidates wait in the manual-review queue instead.
    pub async fn ingest_candidates(
        &mut self,
        candidates: Vec<CandidateTransaction>,
    ) -> Result<IngestReport> {
        let mut report = IngestReport::default();
        for candidate in candidates {
            if candidate.needs_manual_review {
                self.review_queue.push(candidate);
                report.queued_for_review += 1;
                continue;
            }
            let (record, was_submitted) = self.admit_candidate(candidate.input).await?;
            if was_submitted {
                report.submitted += 1;
            }
            report.merged.push(record);
        }
        Ok(report)
    }

    /// Approve a queued candidate by index, merging it into confirmed state
    pub async fn approve_review(&mut self, index: usize) -> Result<TransactionRecord> {
        if index >= self.review_queue.len() {
            return Err(Error::NotFound(format!("review candidate {}", index)));
        }
        let candidate = self.review_queue.remove(index);
        let (record, _) = self.admit_candidate(candidate.input).await?;
        Ok(record)
    }

    /// Drop a queued candidate by index
    pub fn reject_review(&mut self, index: usize) -> Option<CandidateTransaction> {
        if index < self.review_queue.len() {
            Some(self.review_queue.remove(index))
        } else {
            None
        }
    }

    async fn admit_candidate(
        &mut self,
        raw: RawTransactionInput,
    ) -> Result<(TransactionRecord, bool)> {
        let record = Self::as_confirmed(validate(&raw));
        if record.id.is_some() {
            self.confirmed.push(record.clone());
            self.recompute();
            return Ok((record, false));
        }

        let authoritative = self.submit(&record).await?;
        self.confirmed.push(authoritative.clone());
        self.recompute();
        Ok((authoritative, true))
    }

    // ========== Maintenance ==========

    /// Garbage-collect optimistic entries older than the configured TTL
    pub fn sweep_stale(&mut self) -> Vec<String> {
        let max_age = chrono::Duration::from_std(self.options.stale_after)
            .unwrap_or_else(|_| chrono::Duration::seconds(120));
        let swept = self.ledger.sweep_stale(max_age);
        if !swept.is_empty() {
            for temp_id in &swept {
                self.awaiting_retry.remove(temp_id);
            }
            self.recompute();
        }
        swept
    }

    /// Reset all session state (logout)
    pub fn clear(&mut self) {
        self.ledger.clear();
        self.confirmed.clear();
        self.awaiting_retry.clear();
        self.review_queue.clear();
        self.seen_uploads.clear();
        self.recompute();
    }

    fn fresh_temp_id(&mut self) -> String {
        // Monotonic counter; unique among pending entries by construction
        loop {
            self.next_temp += 1;
            let temp_id = format!("tmp-{}", self.next_temp);
            if !self.ledger.contains(&temp_id) {
                return temp_id;
            }
        }
    }

    /// Statistics are recomputed from scratch as the last step of every
    /// mutation; incremental adjustment invites drift.
    fn recompute(&mut self) {
        self.stats = stats::compute(&self.confirmed, &self.ledger.list_all());
    }
}
