//! Telemetry record model
//!
//! One [`Record`] per measurement. Tags carry identity (host, zone, ...),
//! fields carry values. Maps are ordered so serialized output is stable.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::ContractError;

/// A single telemetry measurement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Measurement name (e.g., "cpu", "diskio")
    pub name: String,

    /// Identity tags, string key/value
    #[serde(default)]
    pub tags: BTreeMap<String, String>,

    /// Measured values
    #[serde(default)]
    pub fields: BTreeMap<String, FieldValue>,

    /// Capture time (UTC); defaults to arrival time when absent on input
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
}

/// A field value - numeric, boolean, or text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    Text(String),
}

impl Record {
    /// Create an empty record with the given measurement name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tags: BTreeMap::new(),
            fields: BTreeMap::new(),
            timestamp: Utc::now(),
        }
    }

    /// Builder-style tag attachment
    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    /// Builder-style field attachment
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// Attach or overwrite a tag
    pub fn add_tag(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.tags.insert(key.into(), value.into());
    }

    /// Tag value lookup
    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags.get(key).map(String::as_str)
    }

    /// Whether a tag is present
    pub fn has_tag(&self, key: &str) -> bool {
        self.tags.contains_key(key)
    }

    /// Parse one NDJSON line into a record
    ///
    /// # Errors
    /// Returns [`ContractError::RecordParse`] on malformed input.
    pub fn from_json_line(line: &str) -> Result<Self, ContractError> {
        serde_json::from_str(line).map_err(|e| ContractError::record_parse(e.to_string()))
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<u64> for FieldValue {
    fn from(value: u64) -> Self {
        Self::UInt(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}
