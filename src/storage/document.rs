//! Stored documents
//!
//! A document is an open key/value map plus a server-assigned id and a
//! creation/update timestamp pair. Its wire form is a flat JSON object:
//!
//! ```text
//! { "id": "...", <fields...>, "createdAt": "...", "updatedAt": "..." }
//! ```

use std::collections::BTreeMap;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use super::value::FieldValue;

/// Keys the server owns; never taken from client input.
pub const RESERVED_KEYS: [&str; 4] = ["id", "_id", "createdAt", "updatedAt"];

/// Returns true if `key` is server-owned.
pub fn is_reserved_key(key: &str) -> bool {
    RESERVED_KEYS.contains(&key)
}

/// One record in a physical collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub fields: BTreeMap<String, FieldValue>,
}

impl Document {
    /// Creates a document with a fresh id and both timestamps set to now.
    pub fn new(fields: BTreeMap<String, FieldValue>) -> Self {
        Self::with_id(Uuid::new_v4().to_string(), fields)
    }

    /// Creates a document with a caller-chosen id.
    pub fn with_id(id: impl Into<String>, fields: BTreeMap<String, FieldValue>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            created_at: now,
            updated_at: now,
            fields,
        }
    }

    /// Builds a document from an untyped JSON object, skipping reserved keys.
    pub fn from_json_object(id: impl Into<String>, object: Map<String, Value>) -> Self {
        let fields = object
            .into_iter()
            .filter(|(k, _)| !is_reserved_key(k))
            .map(|(k, v)| (k, FieldValue::from_json(v)))
            .collect();
        Self::with_id(id, fields)
    }

    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.fields.get(key)
    }

    /// Overwrites the given keys, keeping every other key, and bumps `updated_at`.
    pub fn merge(&mut self, changes: BTreeMap<String, FieldValue>) {
        self.fields.extend(changes);
        self.touch();
    }

    /// Bumps `updated_at`
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    /// Plain JSON of the stored fields only (no id or timestamps).
    pub fn fields_json(&self) -> Map<String, Value> {
        self.fields
            .iter()
            .map(|(k, v)| (k.clone(), v.to_json()))
            .collect()
    }

    /// Wire form
    pub fn to_json(&self) -> Value {
        let mut obj = Map::new();
        obj.insert("id".into(), Value::String(self.id.clone()));
        obj.extend(self.fields_json());
        obj.insert(
            "createdAt".into(),
            Value::String(self.created_at.to_rfc3339_opts(SecondsFormat::Millis, true)),
        );
        obj.insert(
            "updatedAt".into(),
            Value::String(self.updated_at.to_rfc3339_opts(SecondsFormat::Millis, true)),
        );
        Value::Object(obj)
    }
}
