//! Tree serializer
//!
//! Walks a native document and produces a portable JSON tree in which every
//! temporal value, found by its shape rather than its field name, is replaced
//! by ISO-8601 text. Everything else is copied as is.

use herd_backup_types::{DocValue, Timestamp};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::temporal::TemporalValue;

/// Key of a tagged date: `{"$date": "<iso>"}`
pub const DATE_TAG: &str = "$date";

/// How instants are written into a backup file
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DateEncoding {
    /// Bare ISO string; restored by field name
    #[default]
    Iso,
    /// `{"$date": "<iso>"}`; restored under any field name
    Tagged,
}

/// Converts native documents into backup-safe trees
#[derive(Debug, Clone, Copy, Default)]
pub struct TreeSerializer {
    encoding: DateEncoding,
}

impl TreeSerializer {
    pub fn new(encoding: DateEncoding) -> Self {
        Self { encoding }
    }

    /// Serialize a value. Total: unknown shapes pass through untouched.
    pub fn serialize(&self, value: &DocValue) -> Value {
        if let Some(iso) = TemporalValue::detect(value).and_then(|t| t.to_iso()) {
            return self.encode_date(iso);
        }

        match value {
            DocValue::Null => Value::Null,
            DocValue::Bool(b) => Value::Bool(*b),
            DocValue::Number(n) => Value::Number(n.clone()),
            DocValue::String(s) => Value::String(s.clone()),
            DocValue::Array(items) => {
                Value::Array(items.iter().map(|item| self.serialize(item)).collect())
            }
            DocValue::Map(map) => Value::Object(
                map.iter()
                    .map(|(key, item)| (key.clone(), self.serialize(item)))
                    .collect(),
            ),
            DocValue::Timestamp(ts) => self.encode_date(ts.to_iso_string()),
            DocValue::DateTime(dt) => self.encode_date(Timestamp::from_date(*dt).to_iso_string()),
        }
    }

    fn encode_date(&self, iso: String) -> Value {
        match self.encoding {
            DateEncoding::Iso => Value::String(iso),
            DateEncoding::Tagged => {
                let mut tagged = Map::new();
                tagged.insert(DATE_TAG.to_string(), Value::String(iso));
                Value::Object(tagged)
            }
        }
    }
}

/// Serialize with the default bare-ISO encoding
pub fn serialize_for_backup(value: &DocValue) -> Value {
    TreeSerializer::default().serialize(value)
}
