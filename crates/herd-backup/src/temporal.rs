//! Temporal value adapter
//!
//! Decides whether a document value is a point in time and, if so, what ISO
//! string it becomes in a backup. Restoration does not come through here for
//! detection: a parsed JSON string carries no type, so the deserializer relies
//! on field names instead.

use chrono::{DateTime, NaiveDateTime, Utc};
use herd_backup_types::{DocValue, Timestamp};

/// Lowest number read as epoch milliseconds: 2000-01-01T00:00:00.000Z
pub const EPOCH_MILLIS_MIN: i64 = 946_684_800_000;
/// Exclusive upper bound: 3000-01-01T00:00:00.000Z
pub const EPOCH_MILLIS_MAX: i64 = 32_503_680_000_000;

/// The accepted representations of an instant
#[derive(Debug, Clone, PartialEq)]
pub enum TemporalValue {
    /// The store's own timestamp
    Native(Timestamp),
    /// Calendar instant set by application code
    Calendar(DateTime<Utc>),
    /// Milliseconds since the Unix epoch
    EpochMillis(i64),
    /// Already-portable ISO-8601 text
    IsoString(String),
}

impl TemporalValue {
    /// Classify a document value. First match wins; strings are never
    /// detected since they are already portable.
    pub fn detect(value: &DocValue) -> Option<TemporalValue> {
        match value {
            DocValue::Timestamp(ts) => Some(TemporalValue::Native(*ts)),
            DocValue::DateTime(dt) => Some(TemporalValue::Calendar(*dt)),
            DocValue::Number(n) => {
                let millis = n.as_f64()?;
                if millis >= EPOCH_MILLIS_MIN as f64 && millis < EPOCH_MILLIS_MAX as f64 {
                    Some(TemporalValue::EpochMillis(millis.trunc() as i64))
                } else {
                    None
                }
            }
            _ => None,
        }
    }

    /// Convert to the store's native timestamp; `None` if the value does not
    /// denote a representable instant.
    pub fn to_timestamp(&self) -> Option<Timestamp> {
        match self {
            TemporalValue::Native(ts) => Some(*ts),
            TemporalValue::Calendar(dt) => Some(Timestamp::from_date(*dt)),
            TemporalValue::EpochMillis(millis) => Timestamp::from_millis(*millis),
            TemporalValue::IsoString(s) => parse_iso(s).map(Timestamp::from_date),
        }
    }

    /// ISO-8601 with millisecond precision and `Z`
    pub fn to_iso(&self) -> Option<String> {
        match self {
            TemporalValue::IsoString(s) => Some(s.clone()),
            other => other.to_timestamp().map(|ts| ts.to_iso_string()),
        }
    }
}

/// Parse an ISO-8601 date-time. Text without a zone designator is UTC.
pub fn parse_iso(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }

    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}
