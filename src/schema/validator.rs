//! Record validator
//!
//! Checks an untyped field-name -> value mapping against a page's field list
//! before anything is written. Fields are checked in declared order and the
//! first violated rule aborts validation:
//!
//! 1. required: absent, null, or `""` fails
//! 2. absent or null optional values skip the remaining checks
//! 3. `min`/`max` (when non-zero) bound the text length, for every type
//! 4. for `number` fields, `min`/`max` also bound the numeric value
//! 5. `regex` must match somewhere in the text rendering
//!
//! A field's `failure_message` replaces every generated message for it.
//! Keys not declared in the field list are ignored.
//! Validator does not mutate input.

use regex::Regex;
use serde_json::{Map, Value};

use super::types::{FieldSpec, FieldType};
use crate::errors::{EngineError, EngineResult};

/// Validates records against a field list
pub struct RecordValidator<'a> {
    fields: &'a [FieldSpec],
}

impl<'a> RecordValidator<'a> {
    /// Creates a validator over the given fields
    pub fn new(fields: &'a [FieldSpec]) -> Self {
        Self { fields }
    }

    /// Validates `input`, returning the first violation.
    ///
    /// # Errors
    ///
    /// Returns a `VALIDATION_FAILED` error carrying the field name and its
    /// message.
    pub fn validate(&self, input: &Map<String, Value>) -> EngineResult<()> {
        for field in self.fields {
            self.validate_field(field, input.get(&field.field_name))?;
        }
        Ok(())
    }

    fn validate_field(&self, field: &FieldSpec, value: Option<&Value>) -> EngineResult<()> {
        let label = field.label();

        if field.is_required && is_blank(value) {
            return Err(fail(field, format!("{} is required", label)));
        }

        let value = match value {
            None | Some(Value::Null) => return Ok(()),
            Some(v) => v,
        };

        let Some(rules) = &field.validation_rules else {
            return Ok(());
        };

        let text = text_of(value);
        let length = text.chars().count() as f64;

        if let Some(min) = rules.min.filter(|m| *m != 0.0) {
            if length < min {
                return Err(fail(
                    field,
                    format!("{} must be at least {} characters.", label, min),
                ));
            }
        }
        if let Some(max) = rules.max.filter(|m| *m != 0.0) {
            if length > max {
                return Err(fail(
                    field,
                    format!("{} must be no more than {} characters.", label, max),
                ));
            }
        }

        if field.field_type == FieldType::Number {
            if let Some(n) = number_of(value) {
                if let Some(min) = rules.min {
                    if n < min {
                        return Err(fail(field, format!("{} must be at least {}.", label, min)));
                    }
                }
                if let Some(max) = rules.max {
                    if n > max {
                        return Err(fail(
                            field,
                            format!("{} must be no more than {}.", label, max),
                        ));
                    }
                }
            }
        }

        if let Some(pattern) = &rules.regex {
            let re = Regex::new(pattern)
                .map_err(|_| fail(field, format!("{} has an invalid pattern.", label)))?;
            if !re.is_match(&text) {
                return Err(fail(field, format!("{} format is invalid.", label)));
            }
        }

        Ok(())
    }
}

/// Validates `input` against `fields`; see [`RecordValidator`].
pub fn validate(fields: &[FieldSpec], input: &Map<String, Value>) -> EngineResult<()> {
    RecordValidator::new(fields).validate(input)
}

fn fail(field: &FieldSpec, generated: String) -> EngineError {
    let message = field.failure_message.clone().unwrap_or(generated);
    EngineError::validation(&field.field_name, message)
}

fn is_blank(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.is_empty(),
        Some(_) => false,
    }
}

/// Text rendering of a raw value, as used by length and pattern checks.
fn text_of(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        Value::Array(items) => items.iter().map(text_of).collect::<Vec<_>>().join(","),
        other => other.to_string(),
    }
}

/// Numeric reading of a raw value; `None` when it is not a number.
fn number_of(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        Value::String(s) if s.trim().is_empty() => Some(0.0),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|n| n.is_finite())
}
