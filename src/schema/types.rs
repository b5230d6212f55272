//! Page and field definitions
//!
//! Field types:
//! - text, textarea, email, select: stored as text
//! - number: stored as a number
//! - date: stored as a timestamp
//! - checkbox: stored as a boolean
//!
//! Anything else deserializes as `FieldType::Unrecognized` so stored
//! metadata written by another version still loads. New or edited pages
//! reject it in `PageSchema::validate_structure`.

use std::collections::HashSet;
use std::fmt;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::storage::MAX_COLLECTION_NAME_LEN;

/// Declared field type
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FieldType {
    Text,
    Textarea,
    Number,
    Date,
    Checkbox,
    Email,
    Select,
    /// A type name outside the supported set
    Unrecognized(String),
}

impl FieldType {
    /// Returns the type name as declared
    pub fn type_name(&self) -> &str {
        match self {
            FieldType::Text => "text",
            FieldType::Textarea => "textarea",
            FieldType::Number => "number",
            FieldType::Date => "date",
            FieldType::Checkbox => "checkbox",
            FieldType::Email => "email",
            FieldType::Select => "select",
            FieldType::Unrecognized(name) => name,
        }
    }

    pub fn is_recognized(&self) -> bool {
        !matches!(self, FieldType::Unrecognized(_))
    }
}

impl From<String> for FieldType {
    fn from(s: String) -> Self {
        match s.as_str() {
            "text" => FieldType::Text,
            "textarea" => FieldType::Textarea,
            "number" => FieldType::Number,
            "date" => FieldType::Date,
            "checkbox" => FieldType::Checkbox,
            "email" => FieldType::Email,
            "select" => FieldType::Select,
            _ => FieldType::Unrecognized(s),
        }
    }
}

impl From<FieldType> for String {
    fn from(t: FieldType) -> Self {
        t.type_name().to_string()
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.type_name())
    }
}

/// Optional rule set. `min`/`max` bound string length for every type and,
/// for `number` fields, also the numeric value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationRules {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub regex: Option<String>,
}

impl ValidationRules {
    pub fn is_empty(&self) -> bool {
        self.min.is_none() && self.max.is_none() && self.regex.is_none()
    }
}

/// One field's declared shape and rules
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
    /// Storage key and validation key; unique within a page
    pub field_name: String,
    /// Display name, defaults to `field_name`
    #[serde(default)]
    pub field_label: String,
    pub field_type: FieldType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<Value>,
    #[serde(default)]
    pub is_required: bool,
    #[serde(default)]
    pub is_used_for_search: bool,
    #[serde(default)]
    pub is_used_for_stats: bool,
    #[serde(default)]
    pub is_indexed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation_rules: Option<ValidationRules>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field_description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_placeholder: Option<String>,
}

impl FieldSpec {
    /// Create a field with every flag off
    pub fn new(field_name: impl Into<String>, field_type: FieldType) -> Self {
        let field_name = field_name.into();
        Self {
            field_label: field_name.clone(),
            field_name,
            field_type,
            default_value: None,
            is_required: false,
            is_used_for_search: false,
            is_used_for_stats: false,
            is_indexed: false,
            validation_rules: None,
            success_message: None,
            failure_message: None,
            field_description: None,
            input_placeholder: None,
        }
    }

    /// Create a required field
    pub fn required(field_name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            is_required: true,
            ..Self::new(field_name, field_type)
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.field_label = label.into();
        self
    }

    pub fn with_rules(mut self, rules: ValidationRules) -> Self {
        self.validation_rules = Some(rules);
        self
    }

    /// Label for messages; falls back to the field name
    pub fn label(&self) -> &str {
        if self.field_label.trim().is_empty() {
            &self.field_name
        } else {
            &self.field_label
        }
    }

    /// Fills defaulted presentation values.
    pub fn normalize(&mut self) {
        self.field_name = self.field_name.trim().to_string();
        if self.field_label.trim().is_empty() {
            self.field_label = self.field_name.clone();
        }
        if matches!(&self.validation_rules, Some(r) if r.is_empty()) {
            self.validation_rules = None;
        }
    }

    /// Checks this field's own invariants.
    pub fn validate_structure(&self) -> Result<(), String> {
        if self.field_name.is_empty() {
            return Err("Field name is required".into());
        }
        if crate::storage::is_reserved_key(&self.field_name) {
            return Err(format!(
                "Field name '{}' is reserved",
                self.field_name
            ));
        }
        if !self.field_type.is_recognized() {
            return Err(format!(
                "Field '{}' has unsupported type '{}'",
                self.field_name, self.field_type
            ));
        }
        if let Some(rules) = &self.validation_rules {
            for (name, bound) in [("min", rules.min), ("max", rules.max)] {
                if let Some(v) = bound {
                    if !v.is_finite() || v < 0.0 {
                        return Err(format!(
                            "Field '{}': {} must be a non-negative number",
                            self.field_name, name
                        ));
                    }
                }
            }
            if let (Some(min), Some(max)) = (rules.min, rules.max) {
                if min > max {
                    return Err(format!(
                        "Field '{}': min must not exceed max",
                        self.field_name
                    ));
                }
            }
            if let Some(pattern) = &rules.regex {
                Regex::new(pattern).map_err(|e| {
                    format!("Field '{}': invalid regex: {}", self.field_name, e)
                })?;
            }
        }
        Ok(())
    }
}

/// A declared record type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageSchema {
    pub id: String,
    pub page_name: String,
    pub page_description: String,
    /// Front-end address, globally unique
    pub route: String,
    /// Physical collection name, globally unique
    pub table_name: String,
    #[serde(default)]
    pub fields: Vec<FieldSpec>,
    /// Bumped on every update
    #[serde(default = "initial_version")]
    pub version: u64,
    pub created_at: DateTime<Utc>,
}

fn initial_version() -> u64 {
    1
}

impl PageSchema {
    /// Looks up a field by name
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.field_name == name)
    }

    pub fn search_fields(&self) -> impl Iterator<Item = &FieldSpec> {
        self.fields.iter().filter(|f| f.is_used_for_search)
    }

    pub fn stats_fields(&self) -> impl Iterator<Item = &FieldSpec> {
        self.fields.iter().filter(|f| f.is_used_for_stats)
    }

    /// Validates the page definition itself (not a record).
    pub fn validate_structure(&self) -> Result<(), String> {
        if self.page_name.trim().is_empty() {
            return Err("Please add a page name".into());
        }
        if self.page_description.trim().is_empty() {
            return Err("Please add a description".into());
        }
        if self.route.trim().is_empty() {
            return Err("Route is required".into());
        }
        validate_table_name(&self.table_name)?;

        let mut seen = HashSet::new();
        for field in &self.fields {
            field.validate_structure()?;
            if !seen.insert(field.field_name.as_str()) {
                return Err(format!("Duplicate field name '{}'", field.field_name));
            }
        }
        Ok(())
    }
}

/// User table names: 1-64 chars of `[A-Za-z0-9_-]`, no leading `_`.
pub fn validate_table_name(name: &str) -> Result<(), String> {
    if name.is_empty() {
        return Err("Table name is required".into());
    }
    if name.starts_with('_') {
        return Err(format!("Table name '{}' must not start with '_'", name));
    }
    crate::storage::validate_collection_name(name)
        .map_err(|_| format!("Table name '{}' may only contain letters, digits, '_' and '-' (max 64)", name))
}

/// `"My Products"` -> `"/my-products"`
pub fn route_for(page_name: &str) -> String {
    format!("/{}", slug(page_name, '-', usize::MAX))
}

/// `"My Products"` -> `"table_my_products"`, cut to fit a collection name.
pub fn table_name_for(page_name: &str) -> String {
    let budget = MAX_COLLECTION_NAME_LEN - TABLE_PREFIX.len();
    format!("{}{}", TABLE_PREFIX, slug(page_name, '_', budget))
}

const TABLE_PREFIX: &str = "table_";

/// Lowercase ASCII alphanumerics; every other run becomes one `sep`.
fn slug(name: &str, sep: char, max_len: usize) -> String {
    let mut out = String::new();
    for c in name.to_lowercase().chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c);
        } else if !out.is_empty() && !out.ends_with(sep) {
            out.push(sep);
        }
    }
    out.truncate(max_len);
    let trimmed = out.trim_end_matches(sep);
    if trimmed.is_empty() {
        "page".to_string()
    } else {
        trimmed.to_string()
    }
}
