use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use super::Geometry;

/// Unique parcel identifier (the assessor's PID)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParcelId(pub String);

impl ParcelId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ParcelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ParcelId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// A single attribute value carried through from the feature service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
}

impl AttributeValue {
    /// Render the value the way it appears in a mailing-list cell
    pub fn to_cell(&self) -> String {
        match self {
            AttributeValue::Null => String::new(),
            AttributeValue::Bool(b) => b.to_string(),
            AttributeValue::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => {
                format!("{}", *n as i64)
            }
            AttributeValue::Number(n) => n.to_string(),
            AttributeValue::Text(s) => s.clone(),
        }
    }
}

impl From<serde_json::Value> for AttributeValue {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => AttributeValue::Null,
            serde_json::Value::Bool(b) => AttributeValue::Bool(b),
            serde_json::Value::Number(n) => {
                n.as_f64().map(AttributeValue::Number).unwrap_or(AttributeValue::Null)
            }
            serde_json::Value::String(s) => AttributeValue::Text(s),
            // Nested values are kept opaque as their JSON text
            other => AttributeValue::Text(other.to_string()),
        }
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        AttributeValue::Text(value.to_string())
    }
}

impl From<f64> for AttributeValue {
    fn from(value: f64) -> Self {
        AttributeValue::Number(value)
    }
}

/// Attribute bag keyed by field name, sorted for stable export columns
pub type Attributes = BTreeMap<String, AttributeValue>;

/// A land parcel as returned by the feature service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parcel {
    /// Unique identifier
    pub pid: ParcelId,

    /// Boundary geometry (WGS84)
    pub geometry: Geometry,

    /// Opaque attributes (owner, mailing address, ...)
    pub attributes: Attributes,
}

impl Parcel {
    pub fn new(pid: impl Into<ParcelId>, geometry: Geometry, attributes: Attributes) -> Self {
        Self { pid: pid.into(), geometry, attributes }
    }

    pub fn attribute(&self, field: &str) -> Option<&AttributeValue> {
        self.attributes.get(field)
    }
}

impl From<String> for ParcelId {
    fn from(value: String) -> Self {
        Self(value)
    }
}
