//! Seams to the remote API.
//!
//! Implementations live in `services::api` for the browser and in
//! `tesoro-test-support` for tests.

use async_trait::async_trait;
use serde_json::{Map, Value};
use tesoro_api_models::{ListParams, ResourceKind};

use crate::core::error::UiError;
use crate::features::details::key::DetailKey;

/// Fetches one page of a resource and returns the raw response envelope.
#[async_trait(?Send)]
pub trait ListFetcher {
    /// Request a page; the envelope is normalized by the caller.
    ///
    /// # Errors
    /// Returns the transport or server failure.
    async fn fetch_list(&self, resource: ResourceKind, params: &ListParams)
    -> Result<Value, UiError>;
}

/// Loads one detail or summary payload and returns the raw response body.
#[async_trait(?Send)]
pub trait DetailFetcher {
    /// Request `key`; the body is narrowed by [`DetailKey::select`] afterwards.
    ///
    /// # Errors
    /// Returns [`UiError::Validation`] for keys without a lookup, else the
    /// transport or server failure.
    async fn fetch_detail(&self, key: &DetailKey) -> Result<Value, UiError>;
}

/// Applies a partial update to one record.
#[async_trait(?Send)]
pub trait RecordMutator {
    /// Send `patch` for the record `id`; only success or failure matters to callers.
    ///
    /// # Errors
    /// Returns the transport or server failure.
    async fn mutate(
        &self,
        resource: ResourceKind,
        id: &str,
        patch: &Map<String, Value>,
    ) -> Result<Value, UiError>;
}

/// Render query pairs as `?k=v&...`, percent-encoding both sides; empty for no pairs.
#[must_use]
pub fn encode_query(pairs: &[(String, String)]) -> String {
    if pairs.is_empty() {
        return String::new();
    }
    let joined = pairs
        .iter()
        .map(|(name, value)| {
            format!(
                "{}={}",
                urlencoding::encode(name),
                urlencoding::encode(value)
            )
        })
        .collect::<Vec<_>>()
        .join("&");
    format!("?{joined}")
}

/// Body for a partial update: the resource's id field plus `patch`.
///
/// # Errors
/// Returns [`UiError::Validation`] when the resource has no update endpoint.
pub fn update_body(
    resource: ResourceKind,
    id: &str,
    patch: &Map<String, Value>,
) -> Result<(&'static str, Map<String, Value>), UiError> {
    let path = resource
        .update_path()
        .ok_or_else(|| UiError::validation("resource", "is read-only"))?;
    let mut body = Map::new();
    body.insert(resource.id_field().to_string(), Value::String(id.to_string()));
    body.extend(patch.iter().map(|(key, value)| (key.clone(), value.clone())));
    Ok((path, body))
}

#[cfg(test)]
mod tests {
    use super::{encode_query, update_body};
    use serde_json::{Map, json};
    use tesoro_api_models::{ListParams, ResourceKind};

    #[test]
    fn query_is_encoded_in_order() {
        let params = ListParams::new(2, 15).with_filter("searchBy", "gold & silver");
        assert_eq!(
            encode_query(&params.to_query_pairs()),
            "?page=2&limit=15&searchBy=gold%20%26%20silver"
        );
        assert_eq!(encode_query(&[]), "");
    }

    #[test]
    fn update_body_names_the_record() {
        let mut patch = Map::new();
        patch.insert("isBlocked".into(), json!(true));
        let (path, body) = update_body(ResourceKind::Users, "u1", &patch).expect("writable");
        assert_eq!(path, "/users/update");
        assert_eq!(json!(body), json!({"userId": "u1", "isBlocked": true}));
        assert!(update_body(ResourceKind::Tips, "t1", &patch).is_err());
    }
}
