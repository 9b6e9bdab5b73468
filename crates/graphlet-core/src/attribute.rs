//! Attribute types for graph nodes
//!
//! Provides the closed set of attribute type tags a schema may declare,
//! the values stored on nodes, and the per-node attribute collection.

use crate::error::Error;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Declared type of an attribute in a node type's schema
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttributeType {
    String,
    Integer,
    Float,
    Boolean,
    Timestamp,
}

impl AttributeType {
    /// Lowercase tag used in schema documents
    pub fn name(&self) -> &'static str {
        match self {
            AttributeType::String => "string",
            AttributeType::Integer => "integer",
            AttributeType::Float => "float",
            AttributeType::Boolean => "boolean",
            AttributeType::Timestamp => "timestamp",
        }
    }
}

impl fmt::Display for AttributeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for AttributeType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "string" => Ok(AttributeType::String),
            "integer" => Ok(AttributeType::Integer),
            "float" => Ok(AttributeType::Float),
            "boolean" => Ok(AttributeType::Boolean),
            "timestamp" => Ok(AttributeType::Timestamp),
            other => Err(Error::InvalidSchema(format!(
                "unsupported attribute type '{}'",
                other
            ))),
        }
    }
}

/// A value stored on a node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AttributeValue {
    /// UTF-8 string
    String(String),

    /// 64-bit signed integer
    Integer(i64),

    /// 64-bit floating point
    Float(f64),

    /// Boolean value
    Boolean(bool),

    /// Point in time, UTC
    Timestamp(DateTime<Utc>),
}

impl AttributeValue {
    /// The type tag this value satisfies
    pub fn attribute_type(&self) -> AttributeType {
        match self {
            AttributeValue::String(_) => AttributeType::String,
            AttributeValue::Integer(_) => AttributeType::Integer,
            AttributeValue::Float(_) => AttributeType::Float,
            AttributeValue::Boolean(_) => AttributeType::Boolean,
            AttributeValue::Timestamp(_) => AttributeType::Timestamp,
        }
    }

    /// Try to get as string reference
    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttributeValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Try to get as integer
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            AttributeValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Try to get as float
    pub fn as_float(&self) -> Option<f64> {
        match self {
            AttributeValue::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Try to get as boolean
    pub fn as_boolean(&self) -> Option<bool> {
        match self {
            AttributeValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Try to get as timestamp
    pub fn as_timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            AttributeValue::Timestamp(ts) => Some(*ts),
            _ => None,
        }
    }
}

impl From<bool> for AttributeValue {
    fn from(v: bool) -> Self {
        AttributeValue::Boolean(v)
    }
}

impl From<i64> for AttributeValue {
    fn from(v: i64) -> Self {
        AttributeValue::Integer(v)
    }
}

impl From<i32> for AttributeValue {
    fn from(v: i32) -> Self {
        AttributeValue::Integer(v as i64)
    }
}

impl From<f64> for AttributeValue {
    fn from(v: f64) -> Self {
        AttributeValue::Float(v)
    }
}

impl From<String> for AttributeValue {
    fn from(v: String) -> Self {
        AttributeValue::String(v)
    }
}

impl From<&str> for AttributeValue {
    fn from(v: &str) -> Self {
        AttributeValue::String(v.to_string())
    }
}

impl From<DateTime<Utc>> for AttributeValue {
    fn from(v: DateTime<Utc>) -> Self {
        AttributeValue::Timestamp(v)
    }
}

/// The attribute values of one node
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Attributes {
    inner: HashMap<String, AttributeValue>,
}

impl Attributes {
    /// Create an empty attribute set
    pub fn new() -> Self {
        Self {
            inner: HashMap::new(),
        }
    }

    /// Builder-style insert
    pub fn with<K: Into<String>, V: Into<AttributeValue>>(mut self, key: K, value: V) -> Self {
        self.set(key, value);
        self
    }

    /// Set an attribute value
    pub fn set<K: Into<String>, V: Into<AttributeValue>>(&mut self, key: K, value: V) {
        self.inner.insert(key.into(), value.into());
    }

    /// Get an attribute value
    pub fn get(&self, key: &str) -> Option<&AttributeValue> {
        self.inner.get(key)
    }

    /// Check if an attribute exists
    pub fn contains(&self, key: &str) -> bool {
        self.inner.contains_key(key)
    }

    /// Get the number of attributes
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Iterate over attributes
    pub fn iter(&self) -> impl Iterator<Item = (&String, &AttributeValue)> {
        self.inner.iter()
    }

    /// Get attribute names
    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.inner.keys()
    }
}

impl IntoIterator for Attributes {
    type Item = (String, AttributeValue);
    type IntoIter = std::collections::hash_map::IntoIter<String, AttributeValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.inner.into_iter()
    }
}

impl<K: Into<String>, V: Into<AttributeValue>> FromIterator<(K, V)> for Attributes {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            inner: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}
