//! In-memory overlay of pending optimistic transactions
//!
//! Maps client-generated temp ids to validated records while the
//! corresponding create call is in flight. All operations are synchronous;
//! the coordinator recomputes statistics immediately after each mutation.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::models::{RawTransactionInput, TransactionRecord};
use crate::validate::{merge_and_validate, validate};

/// A pending optimistic record with bookkeeping for recency and staleness
#[derive(Debug, Clone)]
pub struct LedgerEntry {
    pub record: TransactionRecord,
    /// Monotonic insertion sequence; higher = more recently added
    pub seq: u64,
    pub added_at: DateTime<Utc>,
    /// Number of failed submission attempts (for the retain-for-retry policy)
    pub failed_attempts: u32,
}

/// The optimistic ledger: temp id -> pending record
#[derive(Debug, Default)]
pub struct OptimisticLedger {
    entries: HashMap<String, LedgerEntry>,
    next_seq: u64,
}

impl OptimisticLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a pending record under a fresh temp id
    ///
    /// The raw payload is validated on the way in; the stored record always
    /// carries the given temp id and `is_optimistic = true`. An already-used
    /// temp id is rejected, never overwritten.
    pub fn add(&mut self, temp_id: &str, raw: &RawTransactionInput) -> Result<&TransactionRecord> {
        if self.entries.contains_key(temp_id) {
            return Err(Error::DuplicateTempId(temp_id.to_string()));
        }

        let mut stamped = raw.clone();
        stamped.temp_id = Some(temp_id.to_string());
        stamped.id = None;
        let record = validate(&stamped);

        let seq = self.next_seq;
        self.next_seq += 1;
        debug!(temp_id, seq, "optimistic entry added");

        let entry = self.entries.entry(temp_id.to_string()).or_insert(LedgerEntry {
            record,
            seq,
            added_at: Utc::now(),
            failed_attempts: 0,
        });
        Ok(&entry.record)
    }

    /// Merge a partial patch into an existing entry; no-op if absent
    pub fn update(&mut self, temp_id: &str, patch: &RawTransactionInput) -> bool {
        match self.entries.get_mut(temp_id) {
            Some(entry) => {
                entry.record = merge_and_validate(&entry.record, patch);
                true
            }
            None => false,
        }
    }

    /// Remove an entry; no-op returning false if absent
    pub fn remove(&mut self, temp_id: &str) -> bool {
        let removed = self.entries.remove(temp_id).is_some();
        if removed {
            debug!(temp_id, "optimistic entry removed");
        }
        removed
    }

    pub fn get(&self, temp_id: &str) -> Option<&TransactionRecord> {
        self.entries.get(temp_id).map(|e| &e.record)
    }

    pub fn contains(&self, temp_id: &str) -> bool {
        self.entries.contains_key(temp_id)
    }

    /// All pending records in insertion order
    pub fn list_all(&self) -> Vec<TransactionRecord> {
        let mut entries: Vec<&LedgerEntry> = self.entries.values().collect();
        entries.sort_by_key(|e| e.seq);
        entries.iter().map(|e| e.record.clone()).collect()
    }

    /// Pending entries (with bookkeeping), insertion order
    pub fn entries(&self) -> Vec<&LedgerEntry> {
        let mut entries: Vec<&LedgerEntry> = self.entries.values().collect();
        entries.sort_by_key(|e| e.seq);
        entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Empty the ledger (logout/reset)
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Record a failed submission attempt; returns the new attempt count
    pub fn record_failure(&mut self, temp_id: &str) -> Option<u32> {
        self.entries.get_mut(temp_id).map(|entry| {
            entry.failed_attempts += 1;
            entry.failed_attempts
        })
    }

    /// Remove entries older than `max_age`, returning their temp ids
    ///
    /// Garbage-collects optimistic entries whose confirmation never matched
    /// (or never arrived) so a stale placeholder cannot shadow a confirmed
    /// record forever.
    pub fn sweep_stale(&mut self, max_age: Duration) -> Vec<String> {
        let cutoff = Utc::now() - max_age;
        let stale: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, e)| e.added_at < cutoff)
            .map(|(temp_id, _)| temp_id.clone())
            .collect();
        for temp_id in &stale {
            warn!(%temp_id, "sweeping stale optimistic entry");
            self.entries.remove(temp_id);
        }
        stale
    }
}
