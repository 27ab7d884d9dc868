//! Date field registry
//!
//! Names the document fields that hold instants. The per-collection path
//! table documents where dates live; the flat name set is what restoration
//! actually consults, at any depth. A date field missing from the name set
//! silently comes back from a backup as a plain string.

use std::collections::BTreeSet;
use std::path::Path;

use herd_backup_types::Collection;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{BackupError, BackupResult};

/// Dotted paths of date fields per collection
const FARM_DATE_PATHS: &[(Collection, &[&str])] = &[
    (Collection::Farms, &["createdAt", "updatedAt"]),
    (
        Collection::Animals,
        &[
            "birthDate",
            "acquisitionDate",
            "weaningDate",
            "saleDate",
            "deathDate",
            "lastWeighedAt",
            "healthRecords.date",
            "healthRecords.nextDueDate",
            "createdAt",
            "updatedAt",
        ],
    ),
    (
        Collection::BreedingRecords,
        &[
            "breedingDate",
            "pregnancyCheckDate",
            "expectedDueDate",
            "actualBirthDate",
            "createdAt",
            "updatedAt",
        ],
    ),
    (
        Collection::Reminders,
        &["dueDate", "completedAt", "snoozedUntil", "createdAt", "updatedAt"],
    ),
    (Collection::WeightRecords, &["date", "createdAt"]),
    (
        Collection::FarmInvitations,
        &["createdAt", "expiresAt", "acceptedAt"],
    ),
];

/// Bare field names restored as timestamps wherever they appear
const FARM_DATE_FIELD_NAMES: &[&str] = &[
    "acceptedAt",
    "acquisitionDate",
    "actualBirthDate",
    "birthDate",
    "breedingDate",
    "completedAt",
    "createdAt",
    "date",
    "deathDate",
    "deletedAt",
    "dueDate",
    "expectedDueDate",
    "expiresAt",
    "lastWeighedAt",
    "nextDueDate",
    "pregnancyCheckDate",
    "saleDate",
    "snoozedUntil",
    "updatedAt",
    "weaningDate",
];

/// Which document fields are temporal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateFieldRegistry {
    /// Collection name to dotted field paths, for documentation and tooling
    collection_paths: IndexMap<String, Vec<String>>,
    /// Field names consulted during restore
    field_names: BTreeSet<String>,
}

impl DateFieldRegistry {
    /// Build a registry, rejecting tables that name an unknown collection
    /// or whose path leaves are not all in the name set.
    pub fn new(
        collection_paths: IndexMap<String, Vec<String>>,
        field_names: BTreeSet<String>,
    ) -> BackupResult<Self> {
        for name in collection_paths.keys() {
            Collection::from_name(name)?;
        }

        let registry = Self {
            collection_paths,
            field_names,
        };

        let missing = registry.missing_leaf_names();
        if !missing.is_empty() {
            return Err(BackupError::Configuration(format!(
                "date field names missing from registry: {}",
                missing.join(", ")
            )));
        }

        Ok(registry)
    }

    /// The farm application's date fields
    pub fn farm_default() -> Self {
        Self {
            collection_paths: FARM_DATE_PATHS
                .iter()
                .map(|(collection, paths)| {
                    (
                        collection.as_str().to_string(),
                        paths.iter().map(|p| p.to_string()).collect(),
                    )
                })
                .collect(),
            field_names: FARM_DATE_FIELD_NAMES.iter().map(|n| n.to_string()).collect(),
        }
    }

    /// Load a registry from JSON text:
    /// `{"collectionPaths": {"animals": ["birthDate"]}, "fieldNames": ["birthDate"]}`
    pub fn from_json_str(json: &str) -> BackupResult<Self> {
        let raw: DateFieldRegistry = serde_json::from_str(json)?;
        Self::new(raw.collection_paths, raw.field_names)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> BackupResult<Self> {
        let json = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&json)
    }

    /// Add a field name to the restore set
    pub fn with_field_name(mut self, name: impl Into<String>) -> Self {
        self.field_names.insert(name.into());
        self
    }

    /// Whether a field name is restored as a timestamp
    pub fn is_date_field(&self, name: &str) -> bool {
        self.field_names.contains(name)
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.field_names.iter().map(String::as_str)
    }

    /// Documented date paths for a collection
    pub fn paths_for(&self, collection: &str) -> &[String] {
        self.collection_paths
            .get(collection)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Path leaves that the restore set does not contain
    pub fn missing_leaf_names(&self) -> Vec<String> {
        let mut missing: Vec<String> = self
            .collection_paths
            .values()
            .flatten()
            .filter_map(|path| path.rsplit('.').next())
            .filter(|leaf| !self.field_names.contains(*leaf))
            .map(str::to_string)
            .collect();
        missing.sort();
        missing.dedup();
        missing
    }
}

impl Default for DateFieldRegistry {
    fn default() -> Self {
        Self::farm_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_names_cover_every_path_leaf() {
        let registry = DateFieldRegistry::farm_default();
        assert!(
            registry.missing_leaf_names().is_empty(),
            "missing: {:?}",
            registry.missing_leaf_names()
        );
    }

    #[test]
    fn test_every_collection_has_paths() {
        let registry = DateFieldRegistry::farm_default();
        for collection in Collection::IMPORT_ORDER {
            assert!(
                !registry.paths_for(collection.as_str()).is_empty(),
                "no date paths for {}",
                collection
            );
        }
        assert!(registry.paths_for("unknown").is_empty());
    }

    #[test]
    fn test_nested_leaf_is_registered() {
        let registry = DateFieldRegistry::farm_default();
        assert!(registry
            .paths_for("animals")
            .contains(&"healthRecords.nextDueDate".to_string()));
        assert!(registry.is_date_field("nextDueDate"));
        assert!(!registry.is_date_field("name"));
    }

    #[test]
    fn test_new_rejects_unregistered_leaf() {
        let mut paths = IndexMap::new();
        paths.insert("animals".to_string(), vec!["vet.visitedAt".to_string()]);
        let names = BTreeSet::from(["birthDate".to_string()]);

        let err = DateFieldRegistry::new(paths, names).unwrap_err();
        assert!(err.to_string().contains("visitedAt"));
    }

    #[test]
    fn test_new_rejects_unknown_collection() {
        let mut paths = IndexMap::new();
        paths.insert("users".to_string(), vec!["createdAt".to_string()]);
        let names = BTreeSet::from(["createdAt".to_string()]);

        let err = DateFieldRegistry::new(paths, names).unwrap_err();
        assert!(matches!(err, BackupError::Types(_)));
        assert!(err.to_string().contains("users"));
    }

    #[test]
    fn test_from_json_str() {
        let registry = DateFieldRegistry::from_json_str(
            r#"{"collectionPaths": {"animals": ["tags.seenAt"]}, "fieldNames": ["seenAt", "x"]}"#,
        )
        .unwrap();

        assert!(registry.is_date_field("seenAt"));
        assert!(registry.is_date_field("x"));
        assert!(!registry.is_date_field("birthDate"));
        assert_eq!(registry.paths_for("animals"), ["tags.seenAt".to_string()]);
    }

    #[test]
    fn test_from_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("registry.json");
        std::fs::write(
            &path,
            r#"{"collectionPaths": {}, "fieldNames": ["seenAt"]}"#,
        )
        .unwrap();

        let registry = DateFieldRegistry::from_json_file(&path).unwrap();
        assert!(registry.is_date_field("seenAt"));
        assert!(DateFieldRegistry::from_json_file(dir.path().join("missing.json")).is_err());
    }

    #[test]
    fn test_with_field_name() {
        let registry = DateFieldRegistry::farm_default().with_field_name("vaccinatedOn");
        assert!(registry.is_date_field("vaccinatedOn"));
    }
}
