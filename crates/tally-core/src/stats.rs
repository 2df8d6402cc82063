//! Real-time financial statistics
//!
//! Always recomputed from the full record set (confirmed + optimistic)
//! rather than adjusted incrementally. Earlier incremental variants of this
//! logic drifted out of agreement with each other; full recomputation makes
//! the totals a pure function of current state.

use tracing::warn;

use crate::models::{Stats, TransactionKind, TransactionRecord};

/// Compute statistics over the union of confirmed and optimistic records
///
/// Any non-finite amount means a record bypassed validation; rather than
/// propagate a poisoned total to callers, the whole result collapses to
/// all-zero `Stats` with a warning.
pub fn compute(confirmed: &[TransactionRecord], optimistic: &[TransactionRecord]) -> Stats {
    let mut stats = Stats::default();

    for record in confirmed.iter().chain(optimistic.iter()) {
        if !record.amount.is_finite() {
            warn!(
                temp_id = record.temp_id.as_deref(),
                id = record.id.as_deref(),
                "non-finite amount reached the aggregator, returning zero stats"
            );
            return Stats::default();
        }
        stats.transaction_count += 1;
        match record.kind {
            TransactionKind::Income => {
                stats.total_income += record.amount;
                stats.income_count += 1;
            }
            TransactionKind::Expense => {
                stats.total_expenses += record.amount;
                stats.expense_count += 1;
            }
        }
    }

    stats.net_balance = stats.total_income - stats.total_expenses;
    stats
}
