use std::fmt;

use serde::{Deserialize, Serialize};

use crate::vocabulary::ValueKind;

/// A typed acquisition metadata value.
///
/// Serializes untagged, so JSON output carries plain strings, numbers and
/// arrays rather than enum wrappers. Variant order matters for
/// deserialization: integer arrays are tried before float arrays so that
/// `[96, 1024, 30]` round-trips as integers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetadataValue {
    /// Free-form or controlled text
    Text(String),
    /// Single number
    Float(f64),
    /// Array of integers (e.g. array shapes)
    IntArray(Vec<i64>),
    /// Array of numbers (e.g. wavelengths, per-frame energies)
    FloatArray(Vec<f64>),
}

impl MetadataValue {
    /// The value shape, for checking against a tag's descriptor
    pub fn kind(&self) -> ValueKind {
        match self {
            MetadataValue::Text(_) => ValueKind::Text,
            MetadataValue::Float(_) => ValueKind::Float,
            MetadataValue::IntArray(_) => ValueKind::IntArray,
            MetadataValue::FloatArray(_) => ValueKind::FloatArray,
        }
    }

    /// Text content, if this is a text value
    pub fn as_text(&self) -> Option<&str> {
        match self {
            MetadataValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Numeric content, if this is a scalar value
    pub fn as_float(&self) -> Option<f64> {
        match self {
            MetadataValue::Float(v) => Some(*v),
            _ => None,
        }
    }

    /// Integer array content, if present
    pub fn as_int_array(&self) -> Option<&[i64]> {
        match self {
            MetadataValue::IntArray(v) => Some(v),
            _ => None,
        }
    }

    /// Float array content, if present
    pub fn as_float_array(&self) -> Option<&[f64]> {
        match self {
            MetadataValue::FloatArray(v) => Some(v),
            _ => None,
        }
    }
}

impl From<&str> for MetadataValue {
    fn from(value: &str) -> Self {
        MetadataValue::Text(value.to_string())
    }
}

impl From<String> for MetadataValue {
    fn from(value: String) -> Self {
        MetadataValue::Text(value)
    }
}

impl From<f64> for MetadataValue {
    fn from(value: f64) -> Self {
        MetadataValue::Float(value)
    }
}

impl From<Vec<f64>> for MetadataValue {
    fn from(value: Vec<f64>) -> Self {
        MetadataValue::FloatArray(value)
    }
}

impl From<Vec<i64>> for MetadataValue {
    fn from(value: Vec<i64>) -> Self {
        MetadataValue::IntArray(value)
    }
}

impl fmt::Display for MetadataValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetadataValue::Text(s) => write!(f, "{}", s),
            MetadataValue::Float(v) => write!(f, "{}", v),
            MetadataValue::IntArray(v) if v.len() > 8 => write!(f, "[{} values]", v.len()),
            MetadataValue::FloatArray(v) if v.len() > 8 => write!(f, "[{} values]", v.len()),
            MetadataValue::IntArray(v) => write!(f, "{:?}", v),
            MetadataValue::FloatArray(v) => write!(f, "{:?}", v),
        }
    }
}
