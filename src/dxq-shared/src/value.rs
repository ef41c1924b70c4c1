//! Value types for dxq filter processing
//!
//! This module provides the `Value` enum: the literals a filter string can
//! spell, and the attribute values a data map can hold.

use std::fmt;

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::{Number as JsonNumber, Value as JsonValue};

/// A JSON-like value carried through parsing and conversion
///
/// Serializes to plain JSON (`null`, numbers, strings, arrays, objects).
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Value {
    /// Null value
    Null,
    /// Boolean value
    Bool(bool),
    /// Integer value (i64)
    Int(i64),
    /// Float value (f64)
    Float(f64),
    /// String value
    String(String),
    /// Array of values
    Array(Vec<Value>),
    /// Object (key-value pairs, insertion ordered)
    Object(IndexMap<String, Value>),
}

impl Value {
    /// Create a new null value
    #[must_use]
    pub fn null() -> Self {
        Value::Null
    }

    /// Create a new boolean value
    #[must_use]
    pub fn bool(b: bool) -> Self {
        Value::Bool(b)
    }

    /// Create a new integer value
    #[must_use]
    pub fn int(i: i64) -> Self {
        Value::Int(i)
    }

    /// Create a new float value
    #[must_use]
    pub fn float(f: f64) -> Self {
        Value::Float(f)
    }

    /// Create a new string value
    pub fn string(s: impl Into<String>) -> Self {
        Value::String(s.into())
    }

    /// Create a new array value
    #[must_use]
    pub fn array(arr: Vec<Value>) -> Self {
        Value::Array(arr)
    }
}

impl Value {
    /// Check if value is null
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Get the type name of this value
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Int(_) => "integer",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
        }
    }

    /// Borrow the string payload, if this is a string
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Numeric reading of this value.
    ///
    /// Numbers are themselves, booleans are 1/0 and strings count when they
    /// hold a finite number (`"42"`, `" 3.5 "`). Everything else, including
    /// null, has no numeric reading.
    #[must_use]
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Float(f) if !f.is_finite() => None,
            Value::Int(_) | Value::Float(_) => self.raw_number(),
            Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            Value::String(s) => match s.trim() {
                "" => None,
                text => text.parse::<f64>().ok().filter(|n| n.is_finite()),
            },
            _ => None,
        }
    }

    #[allow(clippy::cast_precision_loss)]
    fn raw_number(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Convert to JSON value; fails on non-finite floats
    pub fn to_json(&self) -> crate::Result<JsonValue> {
        let json = match self {
            Value::Null => JsonValue::Null,
            Value::Bool(b) => JsonValue::Bool(*b),
            Value::Int(i) => JsonValue::from(*i),
            Value::Float(f) => JsonNumber::from_f64(*f)
                .map(JsonValue::Number)
                .ok_or_else(|| crate::error::value_error(format!("{f} has no JSON form")))?,
            Value::String(s) => JsonValue::String(s.clone()),
            Value::Array(items) => JsonValue::Array(
                items
                    .iter()
                    .map(Value::to_json)
                    .collect::<crate::Result<_>>()?,
            ),
            Value::Object(entries) => JsonValue::Object(
                entries
                    .iter()
                    .map(|(key, value)| Ok((key.clone(), value.to_json()?)))
                    .collect::<crate::Result<_>>()?,
            ),
        };
        Ok(json)
    }

    /// Convert from JSON value, keeping object key order
    #[must_use]
    pub fn from_json(json: JsonValue) -> Self {
        match json {
            JsonValue::Null => Value::Null,
            JsonValue::Bool(b) => Value::Bool(b),
            JsonValue::Number(n) => n
                .as_i64()
                .map(Value::Int)
                .or_else(|| n.as_f64().map(Value::Float))
                .unwrap_or(Value::Null),
            JsonValue::String(s) => Value::String(s),
            JsonValue::Array(items) => Value::Array(items.into_iter().map(Value::from_json).collect()),
            JsonValue::Object(entries) => Value::Object(
                entries
                    .into_iter()
                    .map(|(key, value)| (key, Value::from_json(value)))
                    .collect(),
            ),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => a == b,
            // 2 and 2.0 are the same number
            (Value::Int(_) | Value::Float(_), Value::Int(_) | Value::Float(_)) => {
                self.raw_number() == other.raw_number()
            }
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a == b,
            _ => false,
        }
    }
}

/// Renders the value the way a filter string would spell it: `NULL`,
/// single-quoted strings with doubled quotes, parenthesized lists.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("NULL"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(fl) => write!(f, "{fl}"),
            Value::String(s) => write!(f, "'{}'", s.replace('\'', "''")),
            Value::Array(items) => {
                f.write_str("(")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str(")")
            }
            Value::Object(_) => match self.to_json() {
                Ok(json) => write!(f, "{json}"),
                Err(_) => Err(fmt::Error),
            },
        }
    }
}

impl<'de> serde::Deserialize<'de> for Value {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        <JsonValue as serde::Deserialize>::deserialize(deserializer).map(Value::from_json)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(arr: Vec<Value>) -> Self {
        Value::Array(arr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_constructors_and_type_names() {
        assert!(Value::null().is_null());
        assert_eq!(Value::bool(true).type_name(), "boolean");
        assert_eq!(Value::int(3).type_name(), "integer");
        assert_eq!(Value::float(1.5).type_name(), "float");
        assert_eq!(Value::string("x").type_name(), "string");
        assert_eq!(Value::array(vec![]).type_name(), "array");
    }

    #[test]
    fn test_as_number() {
        assert_eq!(Value::int(42).as_number(), Some(42.0));
        assert_eq!(Value::float(2.5).as_number(), Some(2.5));
        assert_eq!(Value::string(" 7 ").as_number(), Some(7.0));
        assert_eq!(Value::string("1e2").as_number(), Some(100.0));
        assert_eq!(Value::bool(true).as_number(), Some(1.0));
        assert_eq!(Value::string("abc").as_number(), None);
        assert_eq!(Value::string("").as_number(), None);
        assert_eq!(Value::string("NaN").as_number(), None);
        assert_eq!(Value::string("{Entity.Attr}").as_number(), None);
        assert_eq!(Value::Null.as_number(), None);
        assert_eq!(Value::array(vec![Value::int(1)]).as_number(), None);
    }

    #[test]
    fn test_cross_type_numeric_equality() {
        assert_eq!(Value::int(2), Value::float(2.0));
        assert_ne!(Value::int(2), Value::string("2"));
    }

    #[test]
    fn test_json_round_trip_preserves_key_order() {
        let json = json!({"zeta": 1, "alpha": [true, null, "s"], "mid": 2.5});
        let value = Value::from_json(json.clone());
        match &value {
            Value::Object(map) => {
                let keys: Vec<&str> = map.keys().map(String::as_str).collect();
                assert_eq!(keys, vec!["zeta", "alpha", "mid"]);
            }
            other => panic!("expected object, got {:?}", other),
        }
        assert_eq!(value.to_json().unwrap(), json);
    }

    #[test]
    fn test_to_json_rejects_nan() {
        assert!(Value::float(f64::NAN).to_json().is_err());
    }

    #[test]
    fn test_display_spells_filter_literals() {
        assert_eq!(Value::string("O'Neil").to_string(), "'O''Neil'");
        assert_eq!(
            Value::array(vec![Value::int(1), Value::Null, Value::float(2.5)]).to_string(),
            "(1, NULL, 2.5)"
        );
        let object = Value::from_json(json!({"b": 1, "a": "x"}));
        assert_eq!(object.to_string(), r#"{"b":1,"a":"x"}"#);
    }

    #[test]
    fn test_nan_is_not_equal_to_itself() {
        assert_ne!(Value::float(f64::NAN), Value::float(f64::NAN));
        assert_eq!(Value::float(f64::INFINITY).as_number(), None);
    }

    #[test]
    fn test_deserialize() {
        let value: Value = serde_json::from_str(r#"{"a": [1, "2"]}"#).unwrap();
        assert_eq!(
            serde_json::to_string(&value).unwrap(),
            r#"{"a":[1,"2"]}"#
        );
    }
}
