//! JSON fixtures shaped like the admin API's envelopes.

use serde_json::{Value, json};
use tesoro_api_models::Record;

/// User row with the given block state.
#[must_use]
pub fn user(id: &str, blocked: bool) -> Value {
    json!({
        "_id": id,
        "name": format!("User {id}"),
        "email": format!("{id}@example.com"),
        "isBlocked": blocked,
        "isPremium": false,
    })
}

/// Treasure row.
#[must_use]
pub fn treasure(id: &str, title: &str) -> Value {
    json!({ "_id": id, "title": title, "price": 10, "isDeleted": false })
}

/// Envelope using a resource-specific plural key: `{ "<key>": [...], "total": n }`.
#[must_use]
pub fn keyed_page(key: &str, items: Vec<Value>, total: u64) -> Value {
    let mut envelope = serde_json::Map::new();
    envelope.insert(key.to_string(), Value::Array(items));
    envelope.insert("total".to_string(), json!(total));
    Value::Object(envelope)
}

/// Nested envelope: `{ "data": { "items": [...] }, "meta": { "total": n } }`.
#[must_use]
pub fn nested_page(items: Vec<Value>, total: u64) -> Value {
    json!({ "data": { "items": items }, "meta": { "total": total } })
}

/// Users page with ids `ids`, none blocked.
#[must_use]
pub fn users_page(ids: &[&str], total: u64) -> Value {
    keyed_page(
        "users",
        ids.iter().map(|id| user(id, false)).collect(),
        total,
    )
}

/// Error envelope as sent with non-2xx responses.
#[must_use]
pub fn error_body(message: &str) -> Value {
    json!({ "success": false, "message": message })
}

/// Parse a fixture object into a [`Record`].
///
/// # Panics
/// Panics when `value` is not a JSON object.
#[must_use]
pub fn record(value: Value) -> Record {
    Record::from_value(value).expect("fixture must be a JSON object")
}
