//! Response envelope normalization.
//!
//! # Design
//! - Candidate locations are data (JSON pointers in priority order), not branches.
//! - Malformed input yields empty results; nothing here fails.

use serde_json::Value;
use tesoro_api_models::{ListResult, Record, first_match};

/// Where list endpoints put their rows, in priority order.
pub const ITEM_PATHS: &[&str] = &[
    "/items",
    "/data",
    "/results",
    "/treasures",
    "/categories",
    "/contents",
    "/users",
    "/transactions",
    "/tips",
    "/data/items",
    "/data/results",
];

/// Where list endpoints put the total row count, in priority order.
pub const TOTAL_PATHS: &[&str] = &["/total", "/meta/total", "/pagination/total"];

/// Rows from the first candidate that holds an array; non-object rows are dropped.
#[must_use]
pub fn extract_items(raw: &Value) -> Vec<Record> {
    first_match(raw, ITEM_PATHS, Value::as_array)
        .map(|rows| rows.iter().cloned().filter_map(Record::from_value).collect())
        .unwrap_or_default()
}

/// Total from the first candidate holding a non-negative number, else zero.
#[must_use]
pub fn extract_total(raw: &Value) -> u64 {
    first_match(raw, TOTAL_PATHS, as_count).unwrap_or(0)
}

/// Normalize any envelope into a [`ListResult`].
#[must_use]
pub fn normalize(raw: &Value) -> ListResult {
    ListResult {
        items: extract_items(raw),
        total: extract_total(raw),
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn as_count(value: &Value) -> Option<u64> {
    value.as_u64().or_else(|| {
        value
            .as_f64()
            .filter(|number| number.is_finite() && *number >= 0.0)
            .map(|number| number.trunc() as u64)
    })
}
