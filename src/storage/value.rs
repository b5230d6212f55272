//! Tagged field values
//!
//! Documents are open: every key maps to a `FieldValue`, whether or not the
//! current page declares it. Declared fields are coerced to their physical
//! type by the compiled model; undeclared keys are inferred from their JSON
//! shape and kept as-is.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

/// Largest integer an f64 holds exactly.
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

/// A single stored value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "t", content = "v", rename_all = "lowercase")]
pub enum FieldValue {
    Null,
    Text(String),
    Number(f64),
    Date(DateTime<Utc>),
    Bool(bool),
    /// Arrays, objects, and anything else kept verbatim
    Other(Value),
}

impl FieldValue {
    /// Infers a value from raw JSON without a declared type.
    pub fn from_json(value: Value) -> Self {
        match value {
            Value::Null => FieldValue::Null,
            Value::Bool(b) => FieldValue::Bool(b),
            Value::String(s) => FieldValue::Text(s),
            Value::Number(n) => match n.as_f64() {
                Some(f) => FieldValue::Number(f),
                None => FieldValue::Other(Value::Number(n)),
            },
            other => FieldValue::Other(other),
        }
    }

    /// Renders the value as plain JSON for the wire.
    ///
    /// Integral numbers render as integers so `100` round-trips as `100`.
    pub fn to_json(&self) -> Value {
        match self {
            FieldValue::Null => Value::Null,
            FieldValue::Text(s) => Value::String(s.clone()),
            FieldValue::Number(f) => number_to_json(*f),
            FieldValue::Date(d) => Value::String(d.to_rfc3339_opts(SecondsFormat::Millis, true)),
            FieldValue::Bool(b) => Value::Bool(*b),
            FieldValue::Other(v) => v.clone(),
        }
    }

    /// Text rendering used by search; `None` for null.
    pub fn as_text(&self) -> Option<String> {
        match self {
            FieldValue::Null => None,
            FieldValue::Text(s) => Some(s.clone()),
            FieldValue::Other(v) => Some(v.to_string()),
            other => match other.to_json() {
                Value::String(s) => Some(s),
                v => Some(v.to_string()),
            },
        }
    }

    /// Numeric reading used by statistics. The whole string must parse,
    /// so `"12abc"` is not a number.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            FieldValue::Number(f) if f.is_finite() => Some(*f),
            FieldValue::Text(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
            _ => None,
        }
    }

    /// Returns the type tag name
    pub fn type_name(&self) -> &'static str {
        match self {
            FieldValue::Null => "null",
            FieldValue::Text(_) => "text",
            FieldValue::Number(_) => "number",
            FieldValue::Date(_) => "date",
            FieldValue::Bool(_) => "bool",
            FieldValue::Other(_) => "other",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }
}

fn number_to_json(f: f64) -> Value {
    if f.fract() == 0.0 && f.abs() <= MAX_SAFE_INTEGER {
        return Value::Number(Number::from(f as i64));
    }
    Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn test_inference_from_json() {
        assert_eq!(FieldValue::from_json(json!("a")), FieldValue::Text("a".into()));
        assert_eq!(FieldValue::from_json(json!(3)), FieldValue::Number(3.0));
        assert_eq!(FieldValue::from_json(json!(true)), FieldValue::Bool(true));
        assert_eq!(FieldValue::from_json(json!(null)), FieldValue::Null);
        assert_eq!(
            FieldValue::from_json(json!([1, 2])),
            FieldValue::Other(json!([1, 2]))
        );
    }

    #[test]
    fn test_integral_numbers_render_as_integers() {
        assert_eq!(FieldValue::Number(100.0).to_json(), json!(100));
        assert_eq!(FieldValue::Number(-1.0).to_json(), json!(-1));
        assert_eq!(FieldValue::Number(2.5).to_json(), json!(2.5));
    }

    #[test]
    fn test_non_finite_number_renders_null() {
        assert_eq!(FieldValue::Number(f64::NAN).to_json(), Value::Null);
    }

    #[test]
    fn test_date_renders_rfc3339() {
        let d = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        assert_eq!(FieldValue::Date(d).to_json(), json!("2024-03-01T12:00:00.000Z"));
    }

    #[test]
    fn test_as_number() {
        assert_eq!(FieldValue::Number(4.0).as_number(), Some(4.0));
        assert_eq!(FieldValue::Text(" 7.5 ".into()).as_number(), Some(7.5));
        assert_eq!(FieldValue::Text("seven".into()).as_number(), None);
        assert_eq!(FieldValue::Bool(true).as_number(), None);
    }

    #[test]
    fn test_as_text() {
        assert_eq!(FieldValue::Number(12.0).as_text(), Some("12".into()));
        assert_eq!(FieldValue::Bool(false).as_text(), Some("false".into()));
        assert_eq!(FieldValue::Null.as_text(), None);
    }

    #[test]
    fn test_tagged_serde_keeps_dates_distinct_from_text() {
        let d = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        let stored = serde_json::to_string(&FieldValue::Date(d)).unwrap();
        let back: FieldValue = serde_json::from_str(&stored).unwrap();
        assert_eq!(back, FieldValue::Date(d));
    }
}
