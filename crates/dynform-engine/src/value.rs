//! Live field values
//!
//! A form instance holds one optional [`FieldValue`] per field key. `None`
//! (or a missing entry) means the user has not provided anything.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;

/// Current values of a form instance, keyed by field key
pub type FormValues = HashMap<String, FieldValue>;

/// Raw value of one field
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Bool(bool),
    Number(f64),
    Text(String),
    #[serde(deserialize_with = "one_or_many")]
    Files(Vec<FileRef>),
    /// Anything else (objects, arrays of scalars, malformed file records).
    /// Present, but never of the right kind for any field type.
    Other(serde_json::Value),
}

/// Uploaded file as seen by the browser: name, byte size and MIME type
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRef {
    pub name: String,
    #[serde(deserialize_with = "byte_size")]
    pub size: u64,
    #[serde(rename = "type", alias = "mime_type", default)]
    pub mime_type: String,
}

impl FileRef {
    pub fn new(name: impl Into<String>, size: u64, mime_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            size,
            mime_type: mime_type.into(),
        }
    }
}

fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<FileRef>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(FileRef),
        Many(Vec<FileRef>),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(file) => vec![file],
        OneOrMany::Many(files) => files,
    })
}

/// Byte count; fractional sizes round up, negative or non-finite ones are rejected
fn byte_size<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let size = f64::deserialize(deserializer)?;
    if !size.is_finite() || size < 0.0 {
        return Err(serde::de::Error::custom(format!("invalid file size {}", size)));
    }
    Ok(size.ceil() as u64)
}

impl FieldValue {
    /// Whether the value counts as "not provided" for a required check.
    ///
    /// Empty text, an empty file list and an unchecked checkbox are all
    /// absent. Whitespace-only text is a value.
    pub fn is_absent(&self) -> bool {
        match self {
            Self::Text(s) => s.is_empty(),
            Self::Files(files) => files.is_empty(),
            Self::Bool(checked) => !checked,
            Self::Number(_) | Self::Other(_) => false,
        }
    }

    /// Numeric interpretation: numbers as-is, text whose whole trimmed
    /// content is a finite number. Booleans and files are never numeric.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) if n.is_finite() => Some(*n),
            Self::Text(s) => parse_number(s),
            _ => None,
        }
    }

    /// Scalar rendered as text; `None` for file and other values
    pub fn as_text(&self) -> Option<String> {
        match self {
            Self::Text(s) => Some(s.clone()),
            Self::Number(n) => Some(format_number(*n)),
            Self::Bool(b) => Some(b.to_string()),
            Self::Files(_) | Self::Other(_) => None,
        }
    }

    pub fn files(&self) -> Option<&[FileRef]> {
        match self {
            Self::Files(files) => Some(files),
            _ => None,
        }
    }

    /// Convert a JSON value; `null` maps to `None`, anything without a
    /// dedicated variant is kept as [`FieldValue::Other`]
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        if value.is_null() {
            return None;
        }
        Some(serde_json::from_value(value.clone()).unwrap_or_else(|_| Self::Other(value.clone())))
    }

    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Bool(b) => serde_json::Value::Bool(*b),
            Self::Number(n) => number_to_json(*n),
            Self::Text(s) => serde_json::Value::String(s.clone()),
            Self::Files(files) => {
                serde_json::to_value(files).unwrap_or(serde_json::Value::Null)
            }
            Self::Other(value) => value.clone(),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<f64> for FieldValue {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<i64> for FieldValue {
    fn from(n: i64) -> Self {
        Self::Number(n as f64)
    }
}

impl From<i32> for FieldValue {
    fn from(n: i32) -> Self {
        Self::Number(n as f64)
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<FileRef> for FieldValue {
    fn from(file: FileRef) -> Self {
        Self::Files(vec![file])
    }
}

impl From<Vec<FileRef>> for FieldValue {
    fn from(files: Vec<FileRef>) -> Self {
        Self::Files(files)
    }
}

/// Build a values snapshot from a JSON object. Nulls are absent and skipped;
/// every other entry is kept.
pub fn values_from_json(raw: &serde_json::Value) -> FormValues {
    let Some(map) = raw.as_object() else {
        return FormValues::new();
    };
    map.iter()
        .filter_map(|(key, value)| FieldValue::from_json(value).map(|v| (key.clone(), v)))
        .collect()
}

/// Strict number parse: the whole trimmed string must be a finite number
pub(crate) fn parse_number(s: &str) -> Option<f64> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Shortest rendering: `100000`, `2.5`
pub(crate) fn format_number(n: f64) -> String {
    format!("{}", n)
}

fn number_to_json(n: f64) -> serde_json::Value {
    if n.fract() == 0.0 && n.abs() < 9.007_199_254_740_992e15 {
        serde_json::Value::from(n as i64)
    } else {
        serde_json::Number::from_f64(n)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null)
    }
}
