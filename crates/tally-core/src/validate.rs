//! Coercion of raw payloads into canonical transaction records
//!
//! This is the single choke point between untrusted input and the rest of
//! the engine: the ledger, aggregator and coordinator only ever see records
//! produced here.

use crate::models::{RawTransactionInput, TransactionKind, TransactionRecord, TransactionSource};
use crate::normalize::{normalize_amount, normalize_date};

/// Fallback category for records that arrive without one
pub const DEFAULT_CATEGORY: &str = "Other";

/// Validate a raw payload into a canonical record
///
/// Pure and idempotent: re-validating a validated record (via
/// `RawTransactionInput::from`) yields an equal record. Identity fields are
/// preserved unchanged; missing or invalid fields get their documented
/// defaults (kind = expense, category = "Other", source = manual,
/// date = now).
pub fn validate(raw: &RawTransactionInput) -> TransactionRecord {
    let amount = raw
        .amount
        .as_ref()
        .map(normalize_amount)
        .unwrap_or(0.0);

    let date = raw
        .date
        .as_ref()
        .map(normalize_date)
        .unwrap_or_else(chrono::Utc::now);

    let kind = raw
        .kind
        .as_deref()
        .and_then(|s| s.parse::<TransactionKind>().ok())
        .unwrap_or_default();

    let source = raw
        .source
        .as_deref()
        .and_then(|s| s.parse::<TransactionSource>().ok())
        .unwrap_or_default();

    let category = match raw.category.as_deref().map(str::trim) {
        Some(c) if !c.is_empty() => c.to_string(),
        _ => DEFAULT_CATEGORY.to_string(),
    };

    let description = raw.description.clone().unwrap_or_default();

    TransactionRecord {
        id: raw.id.clone(),
        temp_id: raw.temp_id.clone(),
        amount,
        kind,
        category,
        description,
        date,
        source,
        is_optimistic: raw.temp_id.is_some() && raw.id.is_none(),
    }
}

/// Merge a partial patch onto an existing record and re-validate
///
/// Patch fields that are `None` keep the existing value. Identity fields are
/// never changed by a patch.
pub fn merge_and_validate(
    existing: &TransactionRecord,
    patch: &RawTransactionInput,
) -> TransactionRecord {
    let mut merged = RawTransactionInput::from(existing);
    if let Some(amount) = &patch.amount {
        merged.amount = Some(amount.clone());
    }
    if let Some(kind) = &patch.kind {
        merged.kind = Some(kind.clone());
    }
    if let Some(category) = &patch.category {
        merged.category = Some(category.clone());
    }
    if let Some(description) = &patch.description {
        merged.description = Some(description.clone());
    }
    if let Some(date) = &patch.date {
        merged.date = Some(date.clone());
    }
    if let Some(source) = &patch.source {
        merged.source = Some(source.clone());
    }
    validate(&merged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(json: serde_json::Value) -> RawTransactionInput {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn test_defaults_applied() {
        let record = validate(&raw(json!({})));
        assert_eq!(record.amount, 0.0);
        assert_eq!(record.kind, TransactionKind::Expense);
        assert_eq!(record.category, "Other");
        assert_eq!(record.description, "");
        assert_eq!(record.source, TransactionSource::Manual);
        assert!(record.id.is_none());
        assert!(record.temp_id.is_none());
        assert!(!record.is_optimistic);
    }

    #[test]
    fn test_invalid_kind_defaults_to_expense() {
        let record = validate(&raw(json!({"type": "transfer"})));
        assert_eq!(record.kind, TransactionKind::Expense);
    }

    #[test]
    fn test_blank_category_defaults() {
        let record = validate(&raw(json!({"category": "   "})));
        assert_eq!(record.category, "Other");
    }

    #[test]
    fn test_identity_preserved() {
        let record = validate(&raw(json!({"id": "abc", "amount": 10})));
        assert_eq!(record.id.as_deref(), Some("abc"));
        assert!(!record.is_optimistic);

        let record = validate(&raw(json!({"temp_id": "tmp-1", "amount": 10})));
        assert_eq!(record.temp_id.as_deref(), Some("tmp-1"));
        assert!(record.is_optimistic);
    }

    #[test]
    fn test_currency_string_amount() {
        let record = validate(&raw(json!({"amount": "₹1,234.56 INR"})));
        assert_eq!(record.amount, 1234.56);
    }

    #[test]
    fn test_idempotent() {
        let inputs = [
            json!({"amount": "₹1,234.56", "type": "income", "date": "15/03/2024", "category": "Salary"}),
            json!({"amount": "abc", "type": "junk", "description": "mystery"}),
            json!({"temp_id": "tmp-9", "amount": 500, "type": "expense", "category": "Food", "date": "2024-01-02T03:04:05Z"}),
        ];
        for input in inputs {
            let once = validate(&raw(input));
            let twice = validate(&RawTransactionInput::from(&once));
            assert_eq!(once, twice);
        }
    }

    #[test]
    fn test_merge_patch_overrides_only_given_fields() {
        let base = validate(&raw(json!({
            "temp_id": "tmp-1",
            "amount": 100,
            "type": "expense",
            "category": "Food",
            "description": "lunch",
            "date": "2024-03-15T00:00:00Z"
        })));
        let patch = raw(json!({"amount": 250, "category": "Dining"}));
        let merged = merge_and_validate(&base, &patch);
        assert_eq!(merged.amount, 250.0);
        assert_eq!(merged.category, "Dining");
        assert_eq!(merged.description, "lunch");
        assert_eq!(merged.date, base.date);
        assert_eq!(merged.temp_id.as_deref(), Some("tmp-1"));
        assert!(merged.is_optimistic);
    }
}
