//! Defensive normalization of untrusted amount and date values
//!
//! Upstream payloads (manual entry, OCR candidates, bulk import) arrive with
//! amounts as numbers or currency strings and dates in half a dozen formats.
//! Everything downstream (sums, bucketing, matching) assumes finite numbers
//! and valid timestamps, so these functions recover with safe defaults
//! instead of erroring. Fallbacks are logged at warn level so repeated bad
//! input is visible to operators.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde_json::Value;
use tracing::warn;

/// Normalize an amount value to a finite, non-negative magnitude
///
/// Numbers pass through; strings are stripped to digits, `.` and `-` and
/// parsed as a float. Sign is carried by the transaction kind, so the result
/// is always the absolute value. Unparsable input falls back to `0.0`.
pub fn normalize_amount(input: &Value) -> f64 {
    let parsed = match input {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let cleaned: String = s
                .chars()
                .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
                .collect();
            cleaned.parse::<f64>().ok()
        }
        _ => None,
    };

    match parsed {
        Some(value) if value.is_finite() => value.abs(),
        _ => {
            warn!("Unparsable amount {:?}, falling back to 0", input);
            0.0
        }
    }
}

/// Normalize a date value to a UTC timestamp
///
/// Attempts, in order: RFC 3339, `YYYY-MM-DD`/`YYYY/MM/DD`,
/// `DD-MM-YYYY`/`DD/MM/YYYY` (including two-digit-year variants, with `YY`
/// expanded to `20YY`). Integer values are taken as Unix epoch milliseconds.
/// Unparsable input falls back to the current time.
pub fn normalize_date(input: &Value) -> DateTime<Utc> {
    match input {
        Value::String(s) => parse_date_str(s).unwrap_or_else(|| {
            warn!("Unparsable date {:?}, falling back to now", s);
            Utc::now()
        }),
        Value::Number(n) => match n.as_i64().and_then(|ms| Utc.timestamp_millis_opt(ms).single()) {
            Some(ts) => ts,
            None => {
                warn!("Out-of-range epoch date {:?}, falling back to now", n);
                Utc::now()
            }
        },
        _ => {
            warn!("Unparsable date {:?}, falling back to now", input);
            Utc::now()
        }
    }
}

fn parse_date_str(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }

    // Year-first, then day-first. Day-first deliberately outranks the US
    // month-first convention for ambiguous dates like 03/04/2024.
    let formats = [
        "%Y-%m-%d", // 2024-03-15
        "%Y/%m/%d", // 2024/03/15
        "%d-%m-%Y", // 15-03-2024
        "%d/%m/%Y", // 15/03/2024
    ];

    for fmt in formats {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            return midnight_utc(date);
        }
    }

    // Two-digit-year variants: expand YY to 20YY rather than trusting the
    // chrono %y pivot (which maps 69-99 into the 1900s).
    if let Some(expanded) = expand_two_digit_year(s) {
        for fmt in ["%d-%m-%Y", "%d/%m/%Y"] {
            if let Ok(date) = NaiveDate::parse_from_str(&expanded, fmt) {
                return midnight_utc(date);
            }
        }
    }

    None
}

/// Rewrite DD-MM-YY / DD/MM/YY as DD-MM-20YY
fn expand_two_digit_year(s: &str) -> Option<String> {
    let sep = if s.contains('/') { '/' } else { '-' };
    let parts: Vec<&str> = s.split(sep).collect();
    if parts.len() != 3 {
        return None;
    }
    let year = parts[2];
    if year.len() != 2 || !year.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    Some(format!("{}{}{}{}20{}", parts[0], sep, parts[1], sep, year))
}

fn midnight_utc(date: NaiveDate) -> Option<DateTime<Utc>> {
    date.and_hms_opt(0, 0, 0)
        .map(|naive| Utc.from_utc_datetime(&naive))
}
