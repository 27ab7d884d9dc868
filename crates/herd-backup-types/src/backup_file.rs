//! Backup file layout
//!
//! A backup file is a single JSON document: a `_meta` header describing the
//! export, the farm root document and one array per record collection.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use utoipa::ToSchema;

use crate::error::BackupTypesError;

/// The only backup format version this engine reads and writes
pub const BACKUP_VERSION: u32 = 1;

/// Top-level key of the metadata header
pub const META_KEY: &str = "_meta";

/// Known document collections
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub enum Collection {
    /// Farm root documents
    Farms,
    Animals,
    BreedingRecords,
    Reminders,
    WeightRecords,
    FarmInvitations,
}

impl Collection {
    /// Record collections carried as arrays in a backup file, in file order
    pub const RECORDS: [Collection; 5] = [
        Collection::Animals,
        Collection::BreedingRecords,
        Collection::Reminders,
        Collection::WeightRecords,
        Collection::FarmInvitations,
    ];

    /// Order in which an import writes collections
    pub const IMPORT_ORDER: [Collection; 6] = [
        Collection::Farms,
        Collection::Animals,
        Collection::BreedingRecords,
        Collection::Reminders,
        Collection::WeightRecords,
        Collection::FarmInvitations,
    ];

    /// Collection name in the document store
    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::Farms => "farms",
            Collection::Animals => "animals",
            Collection::BreedingRecords => "breedingRecords",
            Collection::Reminders => "reminders",
            Collection::WeightRecords => "weightRecords",
            Collection::FarmInvitations => "farmInvitations",
        }
    }

    /// Key under which the collection appears in a backup file
    pub fn backup_key(&self) -> &'static str {
        match self {
            Collection::Farms => "farm",
            other => other.as_str(),
        }
    }

    /// Parse a collection from its store name or backup key
    pub fn from_name(s: &str) -> Result<Self, BackupTypesError> {
        match s {
            "farm" | "farms" => Ok(Collection::Farms),
            "animals" => Ok(Collection::Animals),
            "breedingRecords" => Ok(Collection::BreedingRecords),
            "reminders" => Ok(Collection::Reminders),
            "weightRecords" => Ok(Collection::WeightRecords),
            "farmInvitations" => Ok(Collection::FarmInvitations),
            _ => Err(BackupTypesError::UnknownCollection(s.to_string())),
        }
    }
}

impl std::fmt::Display for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Number of documents per record collection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BackupCounts {
    #[serde(default)]
    pub animals: u64,
    #[serde(default)]
    pub breeding_records: u64,
    #[serde(default)]
    pub reminders: u64,
    #[serde(default)]
    pub weight_records: u64,
    #[serde(default)]
    pub farm_invitations: u64,
}

impl BackupCounts {
    /// Count for a record collection (the farm root is not counted)
    pub fn get(&self, collection: Collection) -> u64 {
        match collection {
            Collection::Farms => 0,
            Collection::Animals => self.animals,
            Collection::BreedingRecords => self.breeding_records,
            Collection::Reminders => self.reminders,
            Collection::WeightRecords => self.weight_records,
            Collection::FarmInvitations => self.farm_invitations,
        }
    }

    pub fn set(&mut self, collection: Collection, count: u64) {
        match collection {
            Collection::Farms => {}
            Collection::Animals => self.animals = count,
            Collection::BreedingRecords => self.breeding_records = count,
            Collection::Reminders => self.reminders = count,
            Collection::WeightRecords => self.weight_records = count,
            Collection::FarmInvitations => self.farm_invitations = count,
        }
    }

    pub fn total(&self) -> u64 {
        Collection::RECORDS.iter().map(|c| self.get(*c)).sum()
    }

    /// Lenient read of a `counts` object: missing or ill-typed entries count as 0
    fn from_object(map: &Map<String, Value>) -> Self {
        let mut counts = BackupCounts::default();
        for collection in Collection::RECORDS {
            let count = map
                .get(collection.backup_key())
                .and_then(Value::as_u64)
                .unwrap_or(0);
            counts.set(collection, count);
        }
        counts
    }
}

/// Metadata header written at export time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BackupMeta {
    /// Backup format version
    pub version: u32,
    /// Export instant (ISO-8601)
    pub export_date: String,
    pub farm_id: String,
    pub farm_name: String,
    /// User who ran the export
    pub exported_by: String,
    pub counts: BackupCounts,
}

/// What a backup file claims to be, read leniently from its `_meta` block.
///
/// Fields that are missing or of the wrong type are `None` so the operator
/// still sees everything the file does declare.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MetaPreview {
    pub version: Option<i64>,
    pub export_date: Option<String>,
    pub farm_id: Option<String>,
    pub farm_name: Option<String>,
    pub exported_by: Option<String>,
    pub counts: BackupCounts,
}

impl MetaPreview {
    pub fn from_meta_object(meta: &Map<String, Value>) -> Self {
        let text = |key: &str| meta.get(key).and_then(Value::as_str).map(str::to_string);

        Self {
            version: meta.get("version").and_then(whole_number),
            export_date: text("exportDate"),
            farm_id: text("farmId"),
            farm_name: text("farmName"),
            exported_by: text("exportedBy"),
            counts: meta
                .get("counts")
                .and_then(Value::as_object)
                .map(BackupCounts::from_object)
                .unwrap_or_default(),
        }
    }
}

/// An integer, also when written with a zero fraction (`1.0`)
fn whole_number(value: &Value) -> Option<i64> {
    value.as_i64().or_else(|| {
        value
            .as_f64()
            .filter(|f| f.fract() == 0.0 && *f >= i64::MIN as f64 && *f <= i64::MAX as f64)
            .map(|f| f as i64)
    })
}

/// A complete backup as produced by an export
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupFile {
    #[serde(rename = "_meta")]
    pub meta: BackupMeta,
    /// Farm root document
    pub farm: Value,
    pub animals: Vec<Value>,
    pub breeding_records: Vec<Value>,
    pub reminders: Vec<Value>,
    pub weight_records: Vec<Value>,
    pub farm_invitations: Vec<Value>,
}

impl BackupFile {
    /// Documents of a record collection (empty for the farm root)
    pub fn records(&self, collection: Collection) -> &[Value] {
        match collection {
            Collection::Farms => &[],
            Collection::Animals => &self.animals,
            Collection::BreedingRecords => &self.breeding_records,
            Collection::Reminders => &self.reminders,
            Collection::WeightRecords => &self.weight_records,
            Collection::FarmInvitations => &self.farm_invitations,
        }
    }

    pub fn records_mut(&mut self, collection: Collection) -> Option<&mut Vec<Value>> {
        match collection {
            Collection::Farms => None,
            Collection::Animals => Some(&mut self.animals),
            Collection::BreedingRecords => Some(&mut self.breeding_records),
            Collection::Reminders => Some(&mut self.reminders),
            Collection::WeightRecords => Some(&mut self.weight_records),
            Collection::FarmInvitations => Some(&mut self.farm_invitations),
        }
    }
}
