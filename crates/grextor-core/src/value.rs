//! Scalar metadata model shared by both stores.
//!
//! Document metadata is an open string-keyed map, but only four scalar kinds
//! survive storage with their kind intact: text, 64-bit signed integer,
//! double-precision float and boolean. Anything else is coerced to its text
//! rendering on the way in; [`MetadataValue::coerce`] is the single place where
//! that happens.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Metadata attached to points and nodes.
pub type Metadata = BTreeMap<String, MetadataValue>;

/// A single metadata value.
///
/// Serialized untagged, so JSON output reads `"a"`, `3`, `0.5`, `true`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetadataValue {
    Text(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
}

/// Discriminant of a [`MetadataValue`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Text,
    Integer,
    Float,
    Bool,
}

impl MetadataValue {
    /// Convert an arbitrary JSON value into the closed scalar set.
    ///
    /// Strings, booleans, integers within `i64` and finite floats keep their
    /// kind. Null, arrays, objects and integers outside the signed 64-bit range
    /// become text holding their JSON rendering.
    pub fn coerce(value: serde_json::Value) -> Self {
        use serde_json::Value;

        match value {
            Value::String(s) => MetadataValue::Text(s),
            Value::Bool(b) => MetadataValue::Bool(b),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    MetadataValue::Integer(i)
                } else if n.is_u64() {
                    MetadataValue::Text(n.to_string())
                } else {
                    match n.as_f64() {
                        Some(f) => MetadataValue::Float(f),
                        None => MetadataValue::Text(n.to_string()),
                    }
                }
            }
            other => MetadataValue::Text(other.to_string()),
        }
    }

    pub fn kind(&self) -> ValueKind {
        match self {
            MetadataValue::Text(_) => ValueKind::Text,
            MetadataValue::Integer(_) => ValueKind::Integer,
            MetadataValue::Float(_) => ValueKind::Float,
            MetadataValue::Bool(_) => ValueKind::Bool,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            MetadataValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            MetadataValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            MetadataValue::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            MetadataValue::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl fmt::Display for MetadataValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetadataValue::Text(s) => f.write_str(s),
            MetadataValue::Integer(i) => write!(f, "{}", i),
            MetadataValue::Float(x) => write!(f, "{}", x),
            MetadataValue::Bool(b) => write!(f, "{}", b),
        }
    }
}

impl From<String> for MetadataValue {
    fn from(value: String) -> Self {
        MetadataValue::Text(value)
    }
}

impl From<&str> for MetadataValue {
    fn from(value: &str) -> Self {
        MetadataValue::Text(value.to_string())
    }
}

impl From<i64> for MetadataValue {
    fn from(value: i64) -> Self {
        MetadataValue::Integer(value)
    }
}

impl From<i32> for MetadataValue {
    fn from(value: i32) -> Self {
        MetadataValue::Integer(value as i64)
    }
}

impl From<f64> for MetadataValue {
    fn from(value: f64) -> Self {
        MetadataValue::Float(value)
    }
}

impl From<bool> for MetadataValue {
    fn from(value: bool) -> Self {
        MetadataValue::Bool(value)
    }
}

impl From<serde_json::Value> for MetadataValue {
    fn from(value: serde_json::Value) -> Self {
        MetadataValue::coerce(value)
    }
}

/// Coerce a JSON object into [`Metadata`].
pub fn metadata_from_json(map: serde_json::Map<String, serde_json::Value>) -> Metadata {
    map.into_iter()
        .map(|(k, v)| (k, MetadataValue::coerce(v)))
        .collect()
}
