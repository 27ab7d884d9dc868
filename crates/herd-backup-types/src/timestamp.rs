//! Native document store timestamp
//!
//! The document store keeps instants as a seconds/nanoseconds pair, distinct
//! from the general purpose `chrono::DateTime`. When a stored document is
//! written out as JSON the pair appears as `{"_seconds": .., "_nanoseconds": ..}`.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{BackupTypesError, BackupTypesResult};

const NANOS_PER_SECOND: u32 = 1_000_000_000;

/// Point in time as stored by the document store
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Build a timestamp from its stored seconds/nanoseconds pair
    pub fn new(seconds: i64, nanoseconds: u32) -> BackupTypesResult<Self> {
        if nanoseconds >= NANOS_PER_SECOND {
            return Err(BackupTypesError::InvalidTimestamp(format!(
                "nanoseconds out of range: {}",
                nanoseconds
            )));
        }

        DateTime::from_timestamp(seconds, nanoseconds)
            .map(Timestamp)
            .ok_or_else(|| {
                BackupTypesError::InvalidTimestamp(format!("seconds out of range: {}", seconds))
            })
    }

    /// Build a timestamp from milliseconds since the Unix epoch
    pub fn from_millis(millis: i64) -> Option<Self> {
        DateTime::from_timestamp_millis(millis).map(Timestamp)
    }

    pub fn from_date(date: DateTime<Utc>) -> Self {
        Timestamp(date)
    }

    pub fn seconds(&self) -> i64 {
        self.0.timestamp()
    }

    pub fn nanoseconds(&self) -> u32 {
        self.0.timestamp_subsec_nanos()
    }

    /// Convert to a calendar instant
    pub fn to_date(&self) -> DateTime<Utc> {
        self.0
    }

    pub fn to_millis(&self) -> i64 {
        self.0.timestamp_millis()
    }

    /// ISO-8601 with millisecond precision and a `Z` suffix
    pub fn to_iso_string(&self) -> String {
        self.0.to_rfc3339_opts(SecondsFormat::Millis, true)
    }

    /// Recognize a seconds/nanoseconds pair given as loosely typed integers.
    ///
    /// Both halves must be present and in range; anything else is not a timestamp.
    pub fn from_parts(seconds: Option<i64>, nanoseconds: Option<i64>) -> Option<Self> {
        let seconds = seconds?;
        let nanoseconds = u32::try_from(nanoseconds?).ok()?;
        Timestamp::new(seconds, nanoseconds).ok()
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(date: DateTime<Utc>) -> Self {
        Timestamp(date)
    }
}

impl From<Timestamp> for DateTime<Utc> {
    fn from(ts: Timestamp) -> Self {
        ts.0
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_iso_string())
    }
}

#[derive(Serialize, Deserialize)]
struct StoredTimestamp {
    #[serde(rename = "_seconds")]
    seconds: i64,
    #[serde(rename = "_nanoseconds")]
    nanoseconds: u32,
}

impl Serialize for Timestamp {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        StoredTimestamp {
            seconds: self.seconds(),
            nanoseconds: self.nanoseconds(),
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let stored = StoredTimestamp::deserialize(deserializer)?;
        Timestamp::new(stored.seconds, stored.nanoseconds).map_err(serde::de::Error::custom)
    }
}
