//! Domain models for Tally

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Transaction direction - sign is carried here, never on the amount
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Income,
    /// Default when the payload carries no usable type
    #[default]
    Expense,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Expense => "expense",
        }
    }
}

impl std::str::FromStr for TransactionKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "income" => Ok(Self::Income),
            "expense" => Ok(Self::Expense),
            _ => Err(format!("Unknown transaction kind: {}", s)),
        }
    }
}

impl std::fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Transaction provenance - how the record entered the system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TransactionSource {
    /// Manually entered
    #[default]
    Manual,
    /// Extracted from an uploaded receipt image
    ReceiptUpload,
    /// Extracted from an uploaded bank statement PDF
    BankStatement,
    /// Bulk-imported from a bank CSV export
    Import,
}

impl TransactionSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Manual => "manual",
            Self::ReceiptUpload => "receipt_upload",
            Self::BankStatement => "bank_statement",
            Self::Import => "import",
        }
    }
}

impl std::str::FromStr for TransactionSource {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "manual" => Ok(Self::Manual),
            "receipt_upload" | "receipt" => Ok(Self::ReceiptUpload),
            "bank_statement" => Ok(Self::BankStatement),
            "import" => Ok(Self::Import),
            _ => Err(format!("Unknown transaction source: {}", s)),
        }
    }
}

impl std::fmt::Display for TransactionSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A canonical transaction record
///
/// Produced only by the validator; downstream code can rely on the amount
/// being finite and non-negative and on exactly one identity field being set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    /// Server-assigned identity; None until the create is confirmed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Client-generated correlation key; Some only on optimistic records
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temp_id: Option<String>,
    /// Non-negative magnitude; direction lives on `kind`
    pub amount: f64,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    pub category: String,
    pub description: String,
    pub date: DateTime<Utc>,
    pub source: TransactionSource,
    /// True only while the record lives in the optimistic ledger
    pub is_optimistic: bool,
}

impl TransactionRecord {
    /// Whether this record carries a confirmed server identity
    pub fn is_confirmed(&self) -> bool {
        self.id.is_some()
    }
}

/// A raw transaction payload from an untrusted source
///
/// Every inbound shape (manual form, ingestion candidate, bulk import,
/// server response body) deserializes into this one type; the validator is
/// the single place it becomes a `TransactionRecord`. `amount` and `date`
/// stay as raw JSON values so numbers, strings, and garbage all survive
/// deserialization and reach the normalizer.
///
/// Doubles as the partial-fields patch for ledger updates: `None` means
/// "leave the existing value alone".
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawTransactionInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temp_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<Value>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

impl From<&TransactionRecord> for RawTransactionInput {
    fn from(record: &TransactionRecord) -> Self {
        Self {
            id: record.id.clone(),
            temp_id: record.temp_id.clone(),
            amount: serde_json::Number::from_f64(record.amount).map(Value::Number),
            kind: Some(record.kind.as_str().to_string()),
            category: Some(record.category.clone()),
            description: Some(record.description.clone()),
            date: Some(Value::String(record.date.to_rfc3339())),
            source: Some(record.source.as_str().to_string()),
        }
    }
}

/// Real-time financial statistics over confirmed + optimistic records
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Stats {
    pub total_income: f64,
    pub total_expenses: f64,
    pub net_balance: f64,
    pub transaction_count: i64,
    pub income_count: i64,
    pub expense_count: i64,
}

/// Filters for listing transactions from the service
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListFilters {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<TransactionKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Inclusive start of the date range (YYYY-MM-DD)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    /// Inclusive end of the date range (YYYY-MM-DD)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_round_trip() {
        for kind in [TransactionKind::Income, TransactionKind::Expense] {
            assert_eq!(kind.as_str().parse::<TransactionKind>().unwrap(), kind);
        }
    }

    #[test]
    fn test_source_round_trip() {
        for source in [
            TransactionSource::Manual,
            TransactionSource::ReceiptUpload,
            TransactionSource::BankStatement,
            TransactionSource::Import,
        ] {
            assert_eq!(
                source.as_str().parse::<TransactionSource>().unwrap(),
                source
            );
        }
    }

    #[test]
    fn test_source_receipt_alias() {
        assert_eq!(
            "receipt".parse::<TransactionSource>().unwrap(),
            TransactionSource::ReceiptUpload
        );
    }

    #[test]
    fn test_raw_input_accepts_loose_json() {
        let raw: RawTransactionInput = serde_json::from_str(
            r#"{"amount": "₹1,234.56", "type": "expense", "date": "15/03/2024", "category": "Food"}"#,
        )
        .unwrap();
        assert!(raw.amount.is_some());
        assert!(raw.id.is_none());
        assert_eq!(raw.kind.as_deref(), Some("expense"));
    }

    #[test]
    fn test_record_serializes_type_field() {
        let record = TransactionRecord {
            id: Some("abc".to_string()),
            temp_id: None,
            amount: 5.0,
            kind: TransactionKind::Expense,
            category: "Other".to_string(),
            description: String::new(),
            date: Utc::now(),
            source: TransactionSource::Manual,
            is_optimistic: false,
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["type"], "expense");
        assert!(json.get("temp_id").is_none());
    }
}
