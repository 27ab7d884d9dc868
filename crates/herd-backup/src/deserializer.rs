//! Tree deserializer
//!
//! Restores native timestamps in a parsed backup document. A JSON string has
//! no type, so restoration is driven by field name: only keys listed in the
//! date field registry whose value looks like an ISO date-time are converted.
//! Date-like strings under other keys stay strings.

use std::sync::Arc;

use herd_backup_types::{DocValue, Document};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::registry::DateFieldRegistry;
use crate::serializer::{DateEncoding, DATE_TAG};
use crate::temporal::TemporalValue;

/// Date and time to the second; fraction and zone are not checked here
static ISO_DATE_TIME_PREFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}").expect("static ISO pattern is valid")
});

/// Whether a string has the shape of an ISO-8601 date-time
pub fn looks_like_iso_date(s: &str) -> bool {
    ISO_DATE_TIME_PREFIX.is_match(s)
}

/// Converts parsed backup documents back into native documents
#[derive(Debug, Clone)]
pub struct TreeDeserializer {
    registry: Arc<DateFieldRegistry>,
    encoding: DateEncoding,
}

impl TreeDeserializer {
    pub fn new(registry: Arc<DateFieldRegistry>) -> Self {
        Self {
            registry,
            encoding: DateEncoding::Iso,
        }
    }

    /// Also restore `{"$date": "<iso>"}` maps, under any key, when the
    /// files were written with [`DateEncoding::Tagged`]
    pub fn with_encoding(mut self, encoding: DateEncoding) -> Self {
        self.encoding = encoding;
        self
    }

    pub fn registry(&self) -> &DateFieldRegistry {
        &self.registry
    }

    /// Restore a document parsed from a backup file
    pub fn restore(&self, collection: &str, document: &Value) -> DocValue {
        self.deserialize(collection, DocValue::from(document.clone()))
    }

    /// Restore timestamps in a document tree.
    ///
    /// `collection` is accepted so per-collection rules can be added later;
    /// today one rule applies everywhere. Applying this to its own output
    /// changes nothing.
    pub fn deserialize(&self, collection: &str, value: DocValue) -> DocValue {
        match value {
            DocValue::Array(items) => DocValue::Array(
                items
                    .into_iter()
                    .map(|item| self.deserialize(collection, item))
                    .collect(),
            ),
            DocValue::Map(map) => match self.tagged_date(&map) {
                Some(restored) => restored,
                None => DocValue::Map(
                    map.into_iter()
                        .map(|(key, item)| {
                            let item = self.restore_field(collection, &key, item);
                            (key, item)
                        })
                        .collect(),
                ),
            },
            other => other,
        }
    }

    fn restore_field(&self, collection: &str, key: &str, value: DocValue) -> DocValue {
        match value {
            DocValue::String(s) if self.registry.is_date_field(key) && looks_like_iso_date(&s) => {
                match TemporalValue::IsoString(s.clone()).to_timestamp() {
                    Some(ts) => DocValue::Timestamp(ts),
                    // Shaped like a date but not a real instant: leave it
                    None => DocValue::String(s),
                }
            }
            other => self.deserialize(collection, other),
        }
    }

    /// `{"$date": "<iso>"}`, honoured only for tagged files
    fn tagged_date(&self, map: &Document) -> Option<DocValue> {
        if self.encoding != DateEncoding::Tagged || map.len() != 1 {
            return None;
        }
        let iso = map.get(DATE_TAG)?.as_str()?;
        if !looks_like_iso_date(iso) {
            return None;
        }
        TemporalValue::IsoString(iso.to_string())
            .to_timestamp()
            .map(DocValue::Timestamp)
    }
}

impl Default for TreeDeserializer {
    fn default() -> Self {
        Self::new(Arc::new(DateFieldRegistry::farm_default()))
    }
}

/// Restore with the farm application's default registry
pub fn deserialize_from_backup(collection: &str, document: &Value) -> DocValue {
    TreeDeserializer::default().restore(collection, document)
}
