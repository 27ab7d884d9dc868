//! Native document values
//!
//! `DocValue` is the in-memory document graph as the document store hands it
//! out: plain JSON scalars and containers plus the store's `Timestamp` and
//! calendar instants. Maps keep insertion order so exports diff cleanly.

use chrono::{DateTime, SecondsFormat, Utc};
use indexmap::IndexMap;
use serde_json::{Map, Number, Value};

use crate::timestamp::Timestamp;

/// A document body: field name to value, in insertion order
pub type Document = IndexMap<String, DocValue>;

/// A value inside a stored document
#[derive(Debug, Clone, PartialEq)]
pub enum DocValue {
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    /// The store's native timestamp
    Timestamp(Timestamp),
    /// A calendar instant set by application code
    DateTime(DateTime<Utc>),
    Array(Vec<DocValue>),
    Map(Document),
}

impl DocValue {
    /// Decode a document read from the store's JSON representation.
    ///
    /// Unlike the structural `From<Value>` conversion, objects shaped
    /// `{"_seconds": .., "_nanoseconds": ..}` become native timestamps.
    pub fn from_stored(value: Value) -> Self {
        match value {
            Value::Object(map) => match stored_timestamp(&map) {
                Some(ts) => DocValue::Timestamp(ts),
                None => DocValue::Map(
                    map.into_iter()
                        .map(|(k, v)| (k, DocValue::from_stored(v)))
                        .collect(),
                ),
            },
            Value::Array(items) => {
                DocValue::Array(items.into_iter().map(DocValue::from_stored).collect())
            }
            other => DocValue::from(other),
        }
    }

    /// Encode for the store's JSON representation
    pub fn to_stored(&self) -> Value {
        match self {
            DocValue::Null => Value::Null,
            DocValue::Bool(b) => Value::Bool(*b),
            DocValue::Number(n) => Value::Number(n.clone()),
            DocValue::String(s) => Value::String(s.clone()),
            DocValue::Timestamp(ts) => {
                let mut map = Map::new();
                map.insert("_seconds".to_string(), Value::from(ts.seconds()));
                map.insert("_nanoseconds".to_string(), Value::from(ts.nanoseconds()));
                Value::Object(map)
            }
            DocValue::DateTime(dt) => Value::String(dt.to_rfc3339_opts(SecondsFormat::Millis, true)),
            DocValue::Array(items) => Value::Array(items.iter().map(DocValue::to_stored).collect()),
            DocValue::Map(map) => Value::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), v.to_stored()))
                    .collect(),
            ),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            DocValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            DocValue::Number(n) => n.as_i64(),
            _ => None,
        }
    }

    pub fn as_timestamp(&self) -> Option<Timestamp> {
        match self {
            DocValue::Timestamp(ts) => Some(*ts),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&Document> {
        match self {
            DocValue::Map(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_map_mut(&mut self) -> Option<&mut Document> {
        match self {
            DocValue::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Look up a field when this value is a map
    pub fn get(&self, key: &str) -> Option<&DocValue> {
        self.as_map().and_then(|map| map.get(key))
    }
}

fn stored_timestamp(map: &Map<String, Value>) -> Option<Timestamp> {
    if map.len() != 2 {
        return None;
    }
    Timestamp::from_parts(
        map.get("_seconds").and_then(Value::as_i64),
        map.get("_nanoseconds").and_then(Value::as_i64),
    )
}

/// Structural conversion: every JSON value maps to its plain counterpart.
impl From<Value> for DocValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => DocValue::Null,
            Value::Bool(b) => DocValue::Bool(b),
            Value::Number(n) => DocValue::Number(n),
            Value::String(s) => DocValue::String(s),
            Value::Array(items) => DocValue::Array(items.into_iter().map(DocValue::from).collect()),
            Value::Object(map) => DocValue::Map(
                map.into_iter()
                    .map(|(k, v)| (k, DocValue::from(v)))
                    .collect(),
            ),
        }
    }
}

impl From<Timestamp> for DocValue {
    fn from(ts: Timestamp) -> Self {
        DocValue::Timestamp(ts)
    }
}

impl From<DateTime<Utc>> for DocValue {
    fn from(dt: DateTime<Utc>) -> Self {
        DocValue::DateTime(dt)
    }
}

impl From<&str> for DocValue {
    fn from(s: &str) -> Self {
        DocValue::String(s.to_string())
    }
}

impl From<String> for DocValue {
    fn from(s: String) -> Self {
        DocValue::String(s)
    }
}

impl From<i64> for DocValue {
    fn from(n: i64) -> Self {
        DocValue::Number(n.into())
    }
}

impl From<bool> for DocValue {
    fn from(b: bool) -> Self {
        DocValue::Bool(b)
    }
}

impl From<Document> for DocValue {
    fn from(map: Document) -> Self {
        DocValue::Map(map)
    }
}

impl From<Vec<DocValue>> for DocValue {
    fn from(items: Vec<DocValue>) -> Self {
        DocValue::Array(items)
    }
}
