//! Dynamically typed property values carried by nodes and relationships.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A map of property names to values.
pub type PropertyMap = HashMap<String, Value>;

/// Property value.
///
/// Chunk metadata is loosely typed (scores arrive as numbers or strings,
/// summaries as text, embeddings as lists), so comparisons coerce where
/// the graph query surface needs them to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    List(Vec<Value>),
    Map(HashMap<String, Value>),
}

// ============================================================================
// Accessors
// ============================================================================

impl Value {
    /// Numeric view. Strings that parse as a number are coerced.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Int(i) => Some(*i as f64),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Equality across representations: `Int(3)`, `Float(3.0)` and
    /// `String("3")` all compare equal; otherwise the display forms must match.
    pub fn loose_eq(&self, other: &Value) -> bool {
        if self == other {
            return true;
        }
        match (self.as_float(), other.as_float()) {
            (Some(a), Some(b)) => a == b,
            _ => self.plain_string() == other.plain_string(),
        }
    }

    /// Display form without quoting, used for string-level comparison.
    fn plain_string(&self) -> String {
        match self {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

// ============================================================================
// Conversions (From impls)
// ============================================================================

impl From<bool> for Value { fn from(v: bool) -> Self { Value::Bool(v) } }
impl From<i32> for Value { fn from(v: i32) -> Self { Value::Int(v as i64) } }
impl From<i64> for Value { fn from(v: i64) -> Self { Value::Int(v) } }
/// Values beyond `i64::MAX` fall back to `Float`.
impl From<u64> for Value {
    fn from(v: u64) -> Self { i64::try_from(v).map(Value::Int).unwrap_or(Value::Float(v as f64)) }
}
impl From<f64> for Value { fn from(v: f64) -> Self { Value::Float(v) } }
impl From<String> for Value { fn from(v: String) -> Self { Value::String(v) } }
impl From<&str> for Value { fn from(v: &str) -> Self { Value::String(v.to_owned()) } }
impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self { Value::List(v.into_iter().map(Into::into).collect()) }
}
impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self { v.map(Into::into).unwrap_or(Value::Null) }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => n.as_f64().map(Value::Float).unwrap_or(Value::Null),
            },
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(a) => Value::List(a.into_iter().map(Into::into).collect()),
            serde_json::Value::Object(o) => {
                Value::Map(o.into_iter().map(|(k, v)| (k, v.into())).collect())
            }
        }
    }
}

// ============================================================================
// Display
// ============================================================================

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::String(s) => write!(f, "\"{}\"", s.replace('"', "\\\"")),
            Value::List(l) => {
                write!(f, "[")?;
                for (i, v) in l.iter().enumerate() {
                    if i > 0 { write!(f, ", ")?; }
                    write!(f, "{v}")?;
                }
                write!(f, "]")
            }
            Value::Map(m) => {
                write!(f, "{{")?;
                for (i, (k, v)) in m.iter().enumerate() {
                    if i > 0 { write!(f, ", ")?; }
                    write!(f, "{k}: {v}")?;
                }
                write!(f, "}}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_from() {
        assert_eq!(Value::from("hello"), Value::String("hello".into()));
        assert_eq!(Value::from(42), Value::Int(42));
        assert_eq!(Value::from(0.75), Value::Float(0.75));
        assert_eq!(Value::from(true), Value::Bool(true));
        assert_eq!(Value::from(None::<i64>), Value::Null);
    }

    #[test]
    fn test_u64_beyond_i64_does_not_wrap() {
        assert_eq!(Value::from(7u64), Value::Int(7));
        assert_eq!(Value::from(i64::MAX as u64), Value::Int(i64::MAX));
        assert_eq!(Value::from(u64::MAX), Value::Float(u64::MAX as f64));
        assert!(Value::from(u64::MAX).as_float().is_some_and(|f| f > 0.0));
    }

    #[test]
    fn test_numeric_string_coercion() {
        assert_eq!(Value::from("0.8").as_float(), Some(0.8));
        assert_eq!(Value::from(" 7 ").as_float(), Some(7.0));
        assert_eq!(Value::from("high").as_float(), None);
        assert_eq!(Value::Bool(true).as_float(), None);
    }

    #[test]
    fn test_loose_eq() {
        assert!(Value::Int(3).loose_eq(&Value::Float(3.0)));
        assert!(Value::Int(3).loose_eq(&Value::from("3")));
        assert!(Value::from("summary").loose_eq(&Value::from("summary")));
        assert!(Value::Bool(true).loose_eq(&Value::from("true")));
        assert!(!Value::from("a").loose_eq(&Value::from("b")));
    }

    #[test]
    fn test_from_json() {
        let v: Value = serde_json::json!({"score": 0.9, "tags": ["a", 1]}).into();
        let Value::Map(m) = v else { panic!("expected map") };
        assert_eq!(m.get("score"), Some(&Value::Float(0.9)));
        assert_eq!(
            m.get("tags"),
            Some(&Value::List(vec![Value::from("a"), Value::Int(1)]))
        );
    }
}
