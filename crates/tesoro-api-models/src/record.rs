//! Opaque list rows.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Identifier keys in lookup order; the backend emits Mongo-style `_id` on most rows.
const ID_KEYS: [&str; 2] = ["_id", "id"];

/// A single row returned by a list endpoint.
///
/// Fields are never interpreted beyond the identifier and the toggle fields
/// patched by optimistic mutations.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct Record(Map<String, Value>);

impl Record {
    /// Wrap an existing JSON object.
    #[must_use]
    pub const fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    /// Convert a JSON value into a record when it is an object.
    #[must_use]
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(fields) => Some(Self(fields)),
            _ => None,
        }
    }

    /// Record identifier as a string, from `_id` or `id`.
    #[must_use]
    pub fn id(&self) -> Option<String> {
        ID_KEYS
            .iter()
            .filter_map(|key| self.0.get(*key))
            .find_map(|value| match value {
                Value::String(text) if !text.is_empty() => Some(text.clone()),
                Value::Number(number) => Some(number.to_string()),
                _ => None,
            })
    }

    /// Whether this record carries the given identifier.
    #[must_use]
    pub fn has_id(&self, id: &str) -> bool {
        self.id().is_some_and(|own| own == id)
    }

    /// Read a raw field.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    /// Read a boolean field; missing or non-boolean values read as `false`.
    #[must_use]
    pub fn bool_field(&self, name: &str) -> bool {
        self.0.get(name).and_then(Value::as_bool).unwrap_or(false)
    }

    /// Read a string field.
    #[must_use]
    pub fn str_field(&self, name: &str) -> Option<&str> {
        self.0.get(name).and_then(Value::as_str)
    }

    /// Overwrite a field, returning the previous value.
    pub fn set_field(&mut self, name: impl Into<String>, value: Value) -> Option<Value> {
        self.0.insert(name.into(), value)
    }

    /// Set a field to `value`, or drop it for `None`, returning the previous value.
    pub fn replace_field(&mut self, name: &str, value: Option<Value>) -> Option<Value> {
        let previous = self.0.remove(name);
        if let Some(value) = value {
            self.0.insert(name.to_string(), value);
        }
        previous
    }

    /// Borrow the underlying JSON object.
    #[must_use]
    pub const fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Consume the record and return the JSON object.
    #[must_use]
    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }
}

impl From<Map<String, Value>> for Record {
    fn from(fields: Map<String, Value>) -> Self {
        Self(fields)
    }
}

#[cfg(test)]
mod tests {
    use super::Record;
    use serde_json::{Value, json};

    fn record(value: Value) -> Record {
        Record::from_value(value).expect("object")
    }

    #[test]
    fn id_prefers_underscore_key_and_stringifies_numbers() {
        assert_eq!(record(json!({"_id": "m1", "id": "x"})).id().as_deref(), Some("m1"));
        assert_eq!(record(json!({"id": 42})).id().as_deref(), Some("42"));
        assert_eq!(record(json!({"_id": "", "id": "fallback"})).id().as_deref(), Some("fallback"));
        assert_eq!(record(json!({"name": "anon"})).id(), None);
    }

    #[test]
    fn non_objects_are_not_records() {
        assert!(Record::from_value(json!([1, 2])).is_none());
        assert!(Record::from_value(Value::Null).is_none());
    }

    #[test]
    fn set_field_returns_previous_value() {
        let mut row = record(json!({"id": "u1", "isBlocked": false}));
        let previous = row.set_field("isBlocked", Value::Bool(true));
        assert_eq!(previous, Some(Value::Bool(false)));
        assert!(row.bool_field("isBlocked"));
        assert!(!row.bool_field("missing"));
        assert_eq!(row.replace_field("isBlocked", None), Some(Value::Bool(true)));
        assert!(row.field("isBlocked").is_none());
        assert_eq!(row.replace_field("isBlocked", Some(Value::Bool(false))), None);
        assert_eq!(row.field("isBlocked"), Some(&Value::Bool(false)));
    }
}
