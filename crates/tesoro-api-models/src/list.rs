//! List request parameters, normalized list results, and error envelopes.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::record::Record;

/// Message shown when the server gives no usable error text.
pub const DEFAULT_ERROR_MESSAGE: &str = "Something went wrong";

/// Normalized page of rows plus the server-reported total.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ListResult {
    /// Rows on the current page, in server order.
    pub items: Vec<Record>,
    /// Total rows across all pages as reported by the server.
    pub total: u64,
}

impl ListResult {
    /// Find a row by identifier.
    #[must_use]
    pub fn find(&self, id: &str) -> Option<&Record> {
        self.items.iter().find(|record| record.has_id(id))
    }

    /// Find a row by identifier for in-place patching.
    pub fn find_mut(&mut self, id: &str) -> Option<&mut Record> {
        self.items.iter_mut().find(|record| record.has_id(id))
    }

    /// Number of pages needed for `total` rows at `page_size` rows each (at least one).
    #[must_use]
    pub fn page_count(&self, page_size: u32) -> u64 {
        if page_size == 0 {
            return 1;
        }
        self.total.div_ceil(u64::from(page_size)).max(1)
    }
}

/// Query parameters sent to list endpoints.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ListParams {
    /// One-based page number.
    pub page: u32,
    /// Page size; the backend calls it `limit`.
    pub limit: u32,
    /// Named filters in declared order. Empty values are never sent.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub filters: Vec<(String, String)>,
}

impl ListParams {
    /// Build parameters for a page.
    #[must_use]
    pub const fn new(page: u32, limit: u32) -> Self {
        Self {
            page,
            limit,
            filters: Vec::new(),
        }
    }

    /// Add a filter, skipping blank values.
    #[must_use]
    pub fn with_filter(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let value = value.into();
        let trimmed = value.trim();
        if !trimmed.is_empty() {
            self.filters.push((name.into(), trimmed.to_string()));
        }
        self
    }

    /// Flatten into `(name, value)` pairs for a query string.
    #[must_use]
    pub fn to_query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = vec![
            ("page".to_string(), self.page.to_string()),
            ("limit".to_string(), self.limit.to_string()),
        ];
        pairs.extend(self.filters.iter().cloned());
        pairs
    }
}

/// Error envelope returned by the backend on non-2xx responses.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorBody {
    /// Primary human-readable message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Alternate field some endpoints use instead of `message`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ErrorBody {
    /// Parse an arbitrary body; non-string `message`/`error` values are ignored.
    #[must_use]
    pub fn from_value(body: &Value) -> Self {
        let text = |key: &str| {
            body.get(key)
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|text| !text.is_empty())
                .map(str::to_string)
        };
        Self {
            message: text("message"),
            error: text("error"),
        }
    }

    /// Best available message, falling back to [`DEFAULT_ERROR_MESSAGE`].
    #[must_use]
    pub fn message(&self) -> String {
        self.message
            .as_deref()
            .or(self.error.as_deref())
            .unwrap_or(DEFAULT_ERROR_MESSAGE)
            .to_string()
    }
}
