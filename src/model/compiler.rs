//! Model compiler
//!
//! Turns a field list into a live handle over the physical collection named
//! by the table. Nothing is cached: every call builds a fresh handle from the
//! field list passed in, so a schema edit is visible on the very next
//! request.
//!
//! Physical type mapping:
//! - number -> numeric
//! - date -> temporal
//! - checkbox -> boolean
//! - everything else (including unrecognized types) -> text
//!
//! Handles are open: keys absent from the field list are stored untouched.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde_json::{Map, Value};

use crate::errors::{EngineError, EngineResult};
use crate::schema::{FieldSpec, FieldType};
use crate::storage::{is_reserved_key, CollectionStore, Document, FieldValue};

/// Physical storage type of a declared field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PhysicalType {
    Text,
    Numeric,
    Temporal,
    Boolean,
}

impl PhysicalType {
    /// Deterministic mapping; unrecognized types fall back to text.
    pub fn for_field_type(field_type: &FieldType) -> Self {
        match field_type {
            FieldType::Number => PhysicalType::Numeric,
            FieldType::Date => PhysicalType::Temporal,
            FieldType::Checkbox => PhysicalType::Boolean,
            _ => PhysicalType::Text,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PhysicalType::Text => "text",
            PhysicalType::Numeric => "number",
            PhysicalType::Temporal => "date",
            PhysicalType::Boolean => "boolean",
        }
    }
}

impl fmt::Display for PhysicalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One compiled, typed column
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub label: String,
    pub physical: PhysicalType,
    pub indexed: bool,
}

/// Compiles field lists into model handles
#[derive(Debug, Clone)]
pub struct ModelCompiler {
    store: Arc<dyn CollectionStore>,
}

impl ModelCompiler {
    pub fn new(store: Arc<dyn CollectionStore>) -> Self {
        Self { store }
    }

    /// Builds a fresh handle for `table_name` from `fields`.
    pub fn compile(&self, table_name: &str, fields: &[FieldSpec]) -> ModelHandle {
        let columns = fields
            .iter()
            .map(|f| Column {
                name: f.field_name.clone(),
                label: f.label().to_string(),
                physical: PhysicalType::for_field_type(&f.field_type),
                indexed: f.is_indexed,
            })
            .collect();

        ModelHandle {
            table_name: table_name.to_string(),
            columns,
            store: Arc::clone(&self.store),
        }
    }
}

/// Live handle over one physical collection
#[derive(Debug, Clone)]
pub struct ModelHandle {
    table_name: String,
    columns: Vec<Column>,
    store: Arc<dyn CollectionStore>,
}

impl ModelHandle {
    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// `(field name, physical type)` pairs in declared order
    pub fn physical_types(&self) -> Vec<(String, PhysicalType)> {
        self.columns
            .iter()
            .map(|c| (c.name.clone(), c.physical))
            .collect()
    }

    /// Converts raw input into stored values.
    ///
    /// Declared keys are cast to their physical type; undeclared keys are
    /// inferred; server-owned keys are dropped.
    ///
    /// # Errors
    ///
    /// `VALIDATION_FAILED` when a declared value cannot be cast.
    pub fn coerce(&self, input: &Map<String, Value>) -> EngineResult<BTreeMap<String, FieldValue>> {
        let mut out = BTreeMap::new();
        for (key, value) in input {
            if is_reserved_key(key) {
                continue;
            }
            let stored = match self.column(key) {
                Some(col) => coerce_value(col, value)?,
                None => FieldValue::from_json(value.clone()),
            };
            out.insert(key.clone(), stored);
        }
        Ok(out)
    }

    /// Inserts a new document with a server-assigned id and timestamps.
    pub fn insert(&self, input: &Map<String, Value>) -> EngineResult<Document> {
        let doc = Document::new(self.coerce(input)?);
        Ok(self.store.insert(&self.table_name, doc)?)
    }

    pub fn find(&self, id: &str) -> EngineResult<Option<Document>> {
        Ok(self.store.get(&self.table_name, id)?)
    }

    /// Overwrites the supplied keys of an existing document.
    ///
    /// Returns `None` if no document has this id.
    pub fn update(&self, id: &str, input: &Map<String, Value>) -> EngineResult<Option<Document>> {
        let changes = self.coerce(input)?;
        let Some(mut doc) = self.store.get(&self.table_name, id)? else {
            return Ok(None);
        };
        doc.merge(changes);
        Ok(Some(self.store.replace(&self.table_name, doc)?))
    }

    pub fn delete(&self, id: &str) -> EngineResult<bool> {
        Ok(self.store.delete(&self.table_name, id)?)
    }

    pub fn count(&self) -> EngineResult<usize> {
        Ok(self.store.count(&self.table_name)?)
    }

    pub fn scan(&self, skip: usize, limit: usize) -> EngineResult<Vec<Document>> {
        Ok(self.store.scan(&self.table_name, skip, limit)?)
    }

    pub fn all(&self) -> EngineResult<Vec<Document>> {
        Ok(self.store.all(&self.table_name)?)
    }
}

fn coerce_value(col: &Column, value: &Value) -> EngineResult<FieldValue> {
    let cast = match col.physical {
        PhysicalType::Text => cast_text(value),
        PhysicalType::Numeric => cast_number(value),
        PhysicalType::Temporal => cast_date(value),
        PhysicalType::Boolean => cast_bool(value),
    };
    cast.ok_or_else(|| {
        EngineError::validation(
            &col.name,
            format!("{} must be a valid {}", col.label, col.physical),
        )
    })
}

fn cast_text(value: &Value) -> Option<FieldValue> {
    match value {
        Value::Null => Some(FieldValue::Null),
        Value::String(s) => Some(FieldValue::Text(s.clone())),
        Value::Number(n) => Some(FieldValue::Text(n.to_string())),
        Value::Bool(b) => Some(FieldValue::Text(b.to_string())),
        _ => None,
    }
}

fn cast_number(value: &Value) -> Option<FieldValue> {
    match value {
        Value::Null => Some(FieldValue::Null),
        Value::Number(n) => n.as_f64().map(FieldValue::Number),
        Value::Bool(b) => Some(FieldValue::Number(if *b { 1.0 } else { 0.0 })),
        Value::String(s) if s.trim().is_empty() => Some(FieldValue::Null),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|n| n.is_finite())
            .map(FieldValue::Number),
        _ => None,
    }
}

fn cast_date(value: &Value) -> Option<FieldValue> {
    match value {
        Value::Null => Some(FieldValue::Null),
        Value::String(s) if s.trim().is_empty() => Some(FieldValue::Null),
        Value::String(s) => parse_date(s.trim()).map(FieldValue::Date),
        Value::Number(n) => n
            .as_i64()
            .and_then(|ms| Utc.timestamp_millis_opt(ms).single())
            .map(FieldValue::Date),
        _ => None,
    }
}

fn parse_date(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(d) = DateTime::parse_from_rfc3339(s) {
        return Some(d.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
}

fn cast_bool(value: &Value) -> Option<FieldValue> {
    match value {
        Value::Null => Some(FieldValue::Null),
        Value::Bool(b) => Some(FieldValue::Bool(*b)),
        Value::Number(n) => match n.as_f64() {
            Some(f) if f == 1.0 => Some(FieldValue::Bool(true)),
            Some(f) if f == 0.0 => Some(FieldValue::Bool(false)),
            _ => None,
        },
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "" => Some(FieldValue::Null),
            "true" | "1" | "yes" | "on" => Some(FieldValue::Bool(true)),
            "false" | "0" | "no" | "off" => Some(FieldValue::Bool(false)),
            _ => None,
        },
        _ => None,
    }
}
