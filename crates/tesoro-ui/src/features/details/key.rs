//! Cache identity and wire shape for detail and summary fetches.

use std::fmt;

use serde_json::{Map, Value, json};
use tesoro_api_models::{REVENUE_SUMMARY_PATH, ResourceKind};

use crate::core::error::UiError;
use crate::features::forms::{DateRangeFilter, FROM_FILTER, TO_FILTER};
use crate::features::lists::normalize::extract_items;

/// Filter used to look a user up through the list endpoint.
const USER_LOOKUP_FILTER: &str = "search";

/// One cached non-list payload.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum DetailKey {
    /// A single record of a resource.
    Record {
        /// Resource owning the record.
        resource: ResourceKind,
        /// Record identifier.
        id: String,
    },
    /// Revenue totals; blank bounds are open.
    RevenueSummary {
        /// Inclusive start, `YYYY-MM-DD` or blank.
        from: String,
        /// Inclusive end, `YYYY-MM-DD` or blank.
        to: String,
    },
}

/// How a detail key is fetched.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DetailRequest {
    /// `POST path` with a JSON body.
    Body {
        /// Endpoint path.
        path: &'static str,
        /// Request body.
        body: Map<String, Value>,
    },
    /// Query-string request with an empty body.
    Query {
        /// Endpoint path.
        path: &'static str,
        /// Encoded in order.
        pairs: Vec<(String, String)>,
        /// `GET` instead of `POST`.
        uses_get: bool,
    },
}

impl DetailKey {
    /// Key for the record `id` of `resource`.
    #[must_use]
    pub fn record(resource: ResourceKind, id: impl Into<String>) -> Self {
        Self::Record {
            resource,
            id: id.into().trim().to_string(),
        }
    }

    /// Key for the revenue summary over `range`.
    #[must_use]
    pub fn revenue_summary(range: &DateRangeFilter) -> Self {
        Self::RevenueSummary {
            from: range.from.trim().to_string(),
            to: range.to.trim().to_string(),
        }
    }

    /// Resource whose mutations supersede fetches of this key.
    #[must_use]
    pub const fn resource(&self) -> ResourceKind {
        match self {
            Self::Record { resource, .. } => *resource,
            Self::RevenueSummary { .. } => ResourceKind::Transactions,
        }
    }

    /// Request that loads this key.
    ///
    /// # Errors
    /// Returns [`UiError::Validation`] for a blank id or a resource without a
    /// single-record lookup.
    pub fn request(&self) -> Result<DetailRequest, UiError> {
        match self {
            Self::Record { id, .. } if id.is_empty() => Err(UiError::validation("id", "is required")),
            Self::Record {
                resource: ResourceKind::Users,
                id,
            } => Ok(DetailRequest::Query {
                path: ResourceKind::Users.list_path(),
                pairs: vec![
                    ("page".to_string(), "1".to_string()),
                    ("limit".to_string(), "1".to_string()),
                    (USER_LOOKUP_FILTER.to_string(), id.clone()),
                ],
                uses_get: ResourceKind::Users.list_uses_get(),
            }),
            Self::Record { resource, id } => {
                let path = resource
                    .detail_path()
                    .ok_or_else(|| UiError::validation("resource", "has no detail view"))?;
                let mut body = Map::new();
                body.insert(resource.id_field().to_string(), Value::String(id.clone()));
                Ok(DetailRequest::Body { path, body })
            }
            Self::RevenueSummary { from, to } => Ok(DetailRequest::Query {
                path: REVENUE_SUMMARY_PATH,
                pairs: [(FROM_FILTER, from), (TO_FILTER, to)]
                    .into_iter()
                    .filter(|(_, value)| !value.is_empty())
                    .map(|(name, value)| (name.to_string(), value.clone()))
                    .collect(),
                uses_get: true,
            }),
        }
    }

    /// Payload to cache for a raw response.
    ///
    /// User lookups go through a list envelope and keep its first row; an empty
    /// page yields a stub carrying only the id.
    #[must_use]
    pub fn select(&self, raw: Value) -> Value {
        match self {
            Self::Record {
                resource: ResourceKind::Users,
                id,
            } => extract_items(&raw)
                .into_iter()
                .next()
                .map_or_else(|| json!({ "id": id }), |record| Value::Object(record.into_map())),
            _ => raw,
        }
    }
}

impl fmt::Display for DetailKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Record { resource, id } => write!(f, "{resource}/{id}"),
            Self::RevenueSummary { from, to } => write!(f, "revenue[{from}..{to}]"),
        }
    }
}
