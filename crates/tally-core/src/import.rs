//! CSV bulk import
//!
//! Parses bank CSV exports into raw transaction inputs. Columns are mapped
//! by header name rather than position so exports from different banks work
//! without per-bank parsers; the values stay untyped here and go through the
//! normalizer/validator like every other untrusted source.

use std::io::Read;

use csv::ReaderBuilder;
use serde_json::Value;
use tracing::debug;

use crate::error::{Error, Result};
use crate::models::{RawTransactionInput, TransactionSource};

/// Recognized header names (case-insensitive) for each field
const DATE_HEADERS: &[&str] = &["date", "transaction date", "posted date"];
const DESCRIPTION_HEADERS: &[&str] = &["description", "details", "memo"];
const AMOUNT_HEADERS: &[&str] = &["amount", "value"];
const KIND_HEADERS: &[&str] = &["type", "kind", "direction"];
const CATEGORY_HEADERS: &[&str] = &["category", "tag"];

/// Parse CSV data into raw transaction inputs
///
/// Requires at least a date and an amount column; description, type and
/// category are picked up when present, extra columns are ignored. Every row
/// is tagged with `source = import`.
pub fn parse_csv<R: Read>(reader: R) -> Result<Vec<RawTransactionInput>> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let headers = rdr.headers()?.clone();
    let columns = ColumnMap::from_headers(headers.iter())?;

    let mut inputs = Vec::new();
    for result in rdr.records() {
        let record = result?;
        let field = |idx: Option<usize>| -> Option<String> {
            idx.and_then(|i| record.get(i))
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };

        inputs.push(RawTransactionInput {
            id: None,
            temp_id: None,
            amount: field(columns.amount).map(Value::String),
            kind: field(columns.kind).map(|s| s.to_lowercase()),
            category: field(columns.category),
            description: field(columns.description),
            date: field(columns.date).map(Value::String),
            source: Some(TransactionSource::Import.as_str().to_string()),
        });
    }

    debug!("Parsed {} CSV rows", inputs.len());
    Ok(inputs)
}

/// Header-name to column-index mapping
struct ColumnMap {
    date: Option<usize>,
    description: Option<usize>,
    amount: Option<usize>,
    kind: Option<usize>,
    category: Option<usize>,
}

impl ColumnMap {
    fn from_headers<'a>(headers: impl Iterator<Item = &'a str>) -> Result<Self> {
        let mut map = Self {
            date: None,
            description: None,
            amount: None,
            kind: None,
            category: None,
        };

        for (i, header) in headers.enumerate() {
            let name = header.trim().to_lowercase();
            let slot = if DATE_HEADERS.contains(&name.as_str()) {
                &mut map.date
            } else if DESCRIPTION_HEADERS.contains(&name.as_str()) {
                &mut map.description
            } else if AMOUNT_HEADERS.contains(&name.as_str()) {
                &mut map.amount
            } else if KIND_HEADERS.contains(&name.as_str()) {
                &mut map.kind
            } else if CATEGORY_HEADERS.contains(&name.as_str()) {
                &mut map.category
            } else {
                continue;
            };
            // First matching column wins
            if slot.is_none() {
                *slot = Some(i);
            }
        }

        if map.date.is_none() || map.amount.is_none() {
            return Err(Error::InvalidData(
                "CSV is missing a date or amount column".to_string(),
            ));
        }
        Ok(map)
    }
}
