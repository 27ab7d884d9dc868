use std::sync::Arc;

use chrono::{SecondsFormat, Utc};
use herd_backup_types::{
    BackupCounts, BackupFile, BackupMeta, Collection, DocValue, ValidationReport,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, info, warn};
use utoipa::ToSchema;
use uuid::Uuid;

use super::config::BackupConfig;
use crate::deserializer::TreeDeserializer;
use crate::error::{BackupError, BackupResult};
use crate::registry::DateFieldRegistry;
use crate::serializer::TreeSerializer;
use crate::store::{DocumentStore, FARM_ID_FIELD};
use crate::validator::BackupValidator;

/// Field carrying a document's id inside a backup file
pub const DOCUMENT_ID_FIELD: &str = "id";

/// Field of the farm document shown as the farm's name
const FARM_NAME_FIELD: &str = "name";

/// Options for a single import run
#[derive(Debug, Clone, Copy, Default)]
pub struct ImportOptions {
    /// Validate and convert everything but write nothing
    pub dry_run: bool,
}

/// What an import wrote
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ImportSummary {
    pub farm_restored: bool,
    pub counts: BackupCounts,
    /// Validator warnings the import went ahead with
    pub warnings: Vec<String>,
    pub dry_run: bool,
}

/// A document converted and ready to be written
struct PreparedDocument {
    collection: Collection,
    id: String,
    body: DocValue,
}

/// Exports a farm's documents to a backup file and imports them back
pub struct BackupService {
    store: Arc<dyn DocumentStore>,
    config: BackupConfig,
    serializer: TreeSerializer,
    deserializer: TreeDeserializer,
    validator: BackupValidator,
}

impl BackupService {
    /// Create a service, resolving the date field registry from the config
    pub fn new(store: Arc<dyn DocumentStore>, config: BackupConfig) -> BackupResult<Self> {
        let registry = config.registry()?;
        Ok(Self::with_registry(store, config, registry))
    }

    pub fn with_registry(
        store: Arc<dyn DocumentStore>,
        config: BackupConfig,
        registry: Arc<DateFieldRegistry>,
    ) -> Self {
        Self {
            store,
            serializer: TreeSerializer::new(config.date_encoding),
            deserializer: TreeDeserializer::new(registry).with_encoding(config.date_encoding),
            validator: BackupValidator::new(config.supported_version),
            config,
        }
    }

    /// Read a farm and all its records into a backup file
    pub async fn export_backup(&self, farm_id: &str, exported_by: &str) -> BackupResult<BackupFile> {
        info!("Exporting backup for farm {}", farm_id);

        let farm = self
            .store
            .get_document(Collection::Farms.as_str(), farm_id)
            .await?
            .ok_or_else(|| BackupError::NotFound(format!("farm '{}'", farm_id)))?;

        let farm_name = farm
            .get(FARM_NAME_FIELD)
            .and_then(DocValue::as_str)
            .unwrap_or_default()
            .to_string();

        let mut backup = BackupFile {
            meta: BackupMeta {
                version: self.config.supported_version,
                export_date: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
                farm_id: farm_id.to_string(),
                farm_name,
                exported_by: exported_by.to_string(),
                counts: BackupCounts::default(),
            },
            farm: self.export_document(farm_id, &farm),
            animals: Vec::new(),
            breeding_records: Vec::new(),
            reminders: Vec::new(),
            weight_records: Vec::new(),
            farm_invitations: Vec::new(),
        };

        for collection in Collection::RECORDS {
            let documents = self
                .store
                .list_documents(collection.as_str(), farm_id)
                .await?;

            let exported: Vec<Value> = documents
                .iter()
                .map(|(id, document)| self.export_document(id, document))
                .collect();

            debug!("Exported {} {} documents", exported.len(), collection);
            backup.meta.counts.set(collection, exported.len() as u64);
            if let Some(records) = backup.records_mut(collection) {
                *records = exported;
            }
        }

        info!(
            "Exported farm {} with {} records",
            farm_id,
            backup.meta.counts.total()
        );
        Ok(backup)
    }

    /// Export straight to JSON text
    pub async fn export_backup_json(&self, farm_id: &str, exported_by: &str) -> BackupResult<String> {
        let backup = self.export_backup(farm_id, exported_by).await?;
        self.render_backup(&backup)
    }

    /// Backup file as JSON text, pretty-printed if configured
    pub fn render_backup(&self, backup: &BackupFile) -> BackupResult<String> {
        let json = if self.config.pretty_output {
            serde_json::to_string_pretty(backup)?
        } else {
            serde_json::to_string(backup)?
        };
        Ok(json)
    }

    /// Serialize a stored document with its id as the first key
    fn export_document(&self, id: &str, document: &DocValue) -> Value {
        match self.serializer.serialize(document) {
            Value::Object(body) => {
                let mut with_id = Map::with_capacity(body.len() + 1);
                with_id.insert(DOCUMENT_ID_FIELD.to_string(), Value::String(id.to_string()));
                with_id.extend(body.into_iter().filter(|(key, _)| key != DOCUMENT_ID_FIELD));
                Value::Object(with_id)
            }
            other => other,
        }
    }

    /// Validate raw backup text without touching the store
    pub fn preview_import(&self, raw_json: &str, current_farm_id: &str) -> ValidationReport {
        self.validator.validate_json(raw_json, current_farm_id)
    }

    /// Validate, convert and write a backup into `current_farm_id`.
    ///
    /// Collections are written in a fixed order: farm, animals, breeding
    /// records, reminders, weight records, invitations. Every document is
    /// converted before the first write. A failed import is retried by
    /// running the whole import again; writes overwrite by id.
    pub async fn import_backup(
        &self,
        data: &Value,
        current_farm_id: &str,
        options: ImportOptions,
    ) -> BackupResult<ImportSummary> {
        let report = self.validator.validate(data, current_farm_id);
        if !report.can_proceed() {
            warn!(
                "Refusing import into farm {}: {}",
                current_farm_id,
                report.errors.join("; ")
            );
            return Err(BackupError::Validation {
                errors: report.errors,
            });
        }
        for warning in &report.warnings {
            warn!("Importing despite warning: {}", warning);
        }

        let prepared = self.prepare_documents(data, current_farm_id)?;

        let mut counts = BackupCounts::default();
        let mut farm_restored = false;
        for document in &prepared {
            match document.collection {
                Collection::Farms => farm_restored = true,
                collection => counts.set(collection, counts.get(collection) + 1),
            }
        }

        if options.dry_run {
            info!(
                "Dry run: would import {} records into farm {}",
                counts.total(),
                current_farm_id
            );
        } else {
            for document in prepared {
                self.store
                    .put_document(document.collection.as_str(), &document.id, document.body)
                    .await?;
            }
            info!(
                "Imported {} records into farm {}",
                counts.total(),
                current_farm_id
            );
        }

        Ok(ImportSummary {
            farm_restored,
            counts,
            warnings: report.warnings,
            dry_run: options.dry_run,
        })
    }

    /// Convert every document of a validated file, in import order
    fn prepare_documents(
        &self,
        data: &Value,
        current_farm_id: &str,
    ) -> BackupResult<Vec<PreparedDocument>> {
        let mut prepared = Vec::new();
        let mut errors = Vec::new();

        for collection in Collection::IMPORT_ORDER {
            match (collection, data.get(collection.backup_key())) {
                (Collection::Farms, Some(farm)) => {
                    let mut body = self.deserializer.restore(collection.as_str(), farm);
                    if let Some(map) = body.as_map_mut() {
                        map.shift_remove(DOCUMENT_ID_FIELD);
                    }
                    prepared.push(PreparedDocument {
                        collection,
                        id: current_farm_id.to_string(),
                        body,
                    });
                }
                (_, Some(Value::Array(documents))) => {
                    for (index, document) in documents.iter().enumerate() {
                        match self.prepare_record(collection, document, current_farm_id) {
                            Some(doc) => prepared.push(doc),
                            None => errors.push(format!(
                                "Collection '{}' entry {} is not an object",
                                collection.backup_key(),
                                index
                            )),
                        }
                    }
                }
                _ => debug!("Skipping {}: not present in backup", collection),
            }
        }

        if !errors.is_empty() {
            return Err(BackupError::Validation { errors });
        }
        Ok(prepared)
    }

    fn prepare_record(
        &self,
        collection: Collection,
        document: &Value,
        current_farm_id: &str,
    ) -> Option<PreparedDocument> {
        let mut body = self.deserializer.restore(collection.as_str(), document);
        let map = body.as_map_mut()?;

        let id = match map.shift_remove(DOCUMENT_ID_FIELD) {
            Some(DocValue::String(id)) if !id.is_empty() => id,
            Some(DocValue::Number(n)) => n.to_string(),
            None | Some(DocValue::Null) => Uuid::new_v4().to_string(),
            Some(other) => {
                let id = Uuid::new_v4().to_string();
                warn!(
                    "{} document has an unusable id {:?}; stored as {}",
                    collection, other, id
                );
                id
            }
        };
        map.insert(
            FARM_ID_FIELD.to_string(),
            DocValue::String(current_farm_id.to_string()),
        );

        Some(PreparedDocument {
            collection,
            id,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::serializer::DateEncoding;
    use crate::store::MemoryDocumentStore;
    use herd_backup_types::Timestamp;
    use serde_json::json;

    async fn seeded_store() -> Arc<MemoryDocumentStore> {
        let store = Arc::new(MemoryDocumentStore::new());
        store
            .put_document(
                "farms",
                "f1",
                DocValue::from_stored(json!({
                    "name": "Green Acres",
                    "createdAt": {"_seconds": 1_600_000_000i64, "_nanoseconds": 0}
                })),
            )
            .await
            .unwrap();
        store
            .put_document(
                "animals",
                "a1",
                DocValue::from_stored(json!({
                    "farmId": "f1",
                    "name": "Bella",
                    "birthDate": {"_seconds": 1_577_836_800i64, "_nanoseconds": 0}
                })),
            )
            .await
            .unwrap();
        store
            .put_document(
                "animals",
                "a2",
                DocValue::from_stored(json!({"farmId": "f2", "name": "Elsewhere"})),
            )
            .await
            .unwrap();
        store
            .put_document(
                "reminders",
                "r1",
                DocValue::from_stored(json!({
                    "farmId": "f1",
                    "title": "Vaccinate",
                    "dueDate": {"_seconds": 1_700_000_000i64, "_nanoseconds": 0}
                })),
            )
            .await
            .unwrap();
        store
    }

    fn service(store: Arc<MemoryDocumentStore>) -> BackupService {
        BackupService::new(store, BackupConfig::default()).unwrap()
    }

    #[tokio::test]
    async fn test_export_builds_meta_and_serializes_dates() {
        let backup = service(seeded_store().await)
            .export_backup("f1", "owner@example.com")
            .await
            .unwrap();

        assert_eq!(backup.meta.version, 1);
        assert_eq!(backup.meta.farm_id, "f1");
        assert_eq!(backup.meta.farm_name, "Green Acres");
        assert_eq!(backup.meta.exported_by, "owner@example.com");
        assert_eq!(backup.meta.counts.animals, 1);
        assert_eq!(backup.meta.counts.reminders, 1);
        assert_eq!(backup.meta.counts.weight_records, 0);

        assert_eq!(
            backup.animals,
            vec![json!({
                "id": "a1",
                "farmId": "f1",
                "name": "Bella",
                "birthDate": "2020-01-01T00:00:00.000Z"
            })]
        );
        assert_eq!(backup.farm["id"], "f1");
        assert_eq!(backup.farm["createdAt"], "2020-09-13T12:26:40.000Z");
    }

    #[tokio::test]
    async fn test_export_missing_farm() {
        let result = service(seeded_store().await).export_backup("nope", "me").await;
        assert!(matches!(result, Err(BackupError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_export_then_import_restores_documents() {
        let source = seeded_store().await;
        let json = service(source.clone())
            .export_backup_json("f1", "me")
            .await
            .unwrap();

        let destination = Arc::new(MemoryDocumentStore::new());
        let data: Value = serde_json::from_str(&json).unwrap();
        let summary = service(destination.clone())
            .import_backup(&data, "f1", ImportOptions::default())
            .await
            .unwrap();

        assert!(summary.farm_restored);
        assert_eq!(summary.counts.animals, 1);
        assert_eq!(summary.counts.reminders, 1);
        assert!(summary.warnings.is_empty());

        for (collection, id) in [("farms", "f1"), ("animals", "a1"), ("reminders", "r1")] {
            assert_eq!(
                destination.get_document(collection, id).await.unwrap(),
                source.get_document(collection, id).await.unwrap(),
                "{}/{}",
                collection,
                id
            );
        }
        assert!(destination.get_document("animals", "a2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_import_into_other_farm_rewrites_farm_id() {
        let backup = service(seeded_store().await)
            .export_backup("f1", "me")
            .await
            .unwrap();
        let data = serde_json::to_value(&backup).unwrap();

        let destination = Arc::new(MemoryDocumentStore::new());
        let summary = service(destination.clone())
            .import_backup(&data, "f9", ImportOptions::default())
            .await
            .unwrap();

        assert_eq!(summary.warnings.len(), 1);
        let animal = destination.get_document("animals", "a1").await.unwrap().unwrap();
        assert_eq!(animal.get("farmId").and_then(DocValue::as_str), Some("f9"));
        assert!(destination.get_document("farms", "f9").await.unwrap().is_some());
        assert!(destination.get_document("farms", "f1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_invalid_file_writes_nothing() {
        let destination = Arc::new(MemoryDocumentStore::new());
        let data = json!({"_meta": {"version": 2, "farmId": "f1"}, "farm": {}, "animals": [{"id": "a1"}]});

        let result = service(destination.clone())
            .import_backup(&data, "f1", ImportOptions::default())
            .await;

        match result {
            Err(BackupError::Validation { errors }) => {
                assert!(errors.iter().any(|e| e.contains("version")))
            }
            other => panic!("expected validation error, got {:?}", other.map(|_| ())),
        }
        assert!(destination.snapshot().await.is_empty());
    }

    #[tokio::test]
    async fn test_non_object_record_rejects_before_writing() {
        let destination = Arc::new(MemoryDocumentStore::new());
        let data = json!({
            "_meta": {"version": 1, "farmId": "f1", "exportDate": "2024-01-01T00:00:00.000Z"},
            "farm": {"name": "Green Acres"},
            "animals": [{"id": "a1"}, 42],
            "breedingRecords": [], "reminders": [], "weightRecords": [], "farmInvitations": []
        });

        let result = service(destination.clone())
            .import_backup(&data, "f1", ImportOptions::default())
            .await;

        assert!(matches!(result, Err(BackupError::Validation { .. })));
        assert!(destination.snapshot().await.is_empty());
    }

    #[tokio::test]
    async fn test_dry_run_writes_nothing() {
        let backup = service(seeded_store().await)
            .export_backup("f1", "me")
            .await
            .unwrap();
        let data = serde_json::to_value(&backup).unwrap();

        let destination = Arc::new(MemoryDocumentStore::new());
        let summary = service(destination.clone())
            .import_backup(&data, "f1", ImportOptions { dry_run: true })
            .await
            .unwrap();

        assert!(summary.dry_run);
        assert_eq!(summary.counts.animals, 1);
        assert!(destination.snapshot().await.is_empty());
    }

    #[tokio::test]
    async fn test_reimport_is_idempotent() {
        let backup = service(seeded_store().await)
            .export_backup("f1", "me")
            .await
            .unwrap();
        let data = serde_json::to_value(&backup).unwrap();

        let destination = Arc::new(MemoryDocumentStore::new());
        let service = service(destination.clone());
        service.import_backup(&data, "f1", ImportOptions::default()).await.unwrap();
        let first = destination.snapshot().await;
        service.import_backup(&data, "f1", ImportOptions::default()).await.unwrap();

        assert_eq!(destination.snapshot().await, first);
    }

    #[tokio::test]
    async fn test_numeric_ids_are_kept_across_reimports() {
        let destination = Arc::new(MemoryDocumentStore::new());
        let data = json!({
            "_meta": {"version": 1, "farmId": "f1", "exportDate": "2024-01-01T00:00:00.000Z"},
            "farm": {"name": "Green Acres"},
            "animals": [{"id": 17, "name": "Bella"}],
            "breedingRecords": [], "reminders": [], "weightRecords": [], "farmInvitations": []
        });

        let service = service(destination.clone());
        service.import_backup(&data, "f1", ImportOptions::default()).await.unwrap();
        service.import_backup(&data, "f1", ImportOptions::default()).await.unwrap();

        assert_eq!(destination.count("animals").await, 1);
        let animal = destination.get_document("animals", "17").await.unwrap().unwrap();
        assert_eq!(animal.get("name").and_then(DocValue::as_str), Some("Bella"));
        assert!(animal.get("id").is_none());
    }

    #[tokio::test]
    async fn test_missing_ids_are_generated() {
        let destination = Arc::new(MemoryDocumentStore::new());
        let data = json!({
            "_meta": {"version": 1, "farmId": "f1", "exportDate": "2024-01-01T00:00:00.000Z"},
            "farm": {"name": "Green Acres"},
            "animals": [{"name": "No Id"}],
            "breedingRecords": [], "reminders": [], "weightRecords": [], "farmInvitations": []
        });

        service(destination.clone())
            .import_backup(&data, "f1", ImportOptions::default())
            .await
            .unwrap();

        let animals = destination.list_documents("animals", "f1").await.unwrap();
        assert_eq!(animals.len(), 1);
        assert!(Uuid::parse_str(&animals[0].0).is_ok());
        assert!(animals[0].1.get("id").is_none());
    }

    #[tokio::test]
    async fn test_tagged_export_round_trips() {
        let source = seeded_store().await;
        let config = BackupConfig {
            date_encoding: DateEncoding::Tagged,
            ..Default::default()
        };
        let backup = BackupService::new(source.clone(), config.clone())
            .unwrap()
            .export_backup("f1", "me")
            .await
            .unwrap();
        assert_eq!(
            backup.animals[0]["birthDate"],
            json!({"$date": "2020-01-01T00:00:00.000Z"})
        );

        let destination = Arc::new(MemoryDocumentStore::new());
        BackupService::new(destination.clone(), config)
            .unwrap()
            .import_backup(&serde_json::to_value(&backup).unwrap(), "f1", ImportOptions::default())
            .await
            .unwrap();

        let animal = destination.get_document("animals", "a1").await.unwrap().unwrap();
        assert_eq!(
            animal.get("birthDate").and_then(DocValue::as_timestamp),
            Some(Timestamp::new(1_577_836_800, 0).unwrap())
        );
    }

    #[tokio::test]
    async fn test_render_backup_honours_pretty_output() {
        let store = seeded_store().await;
        let pretty = service(store.clone());
        let compact = BackupService::new(
            store,
            BackupConfig {
                pretty_output: false,
                ..Default::default()
            },
        )
        .unwrap();

        let backup = pretty.export_backup("f1", "me").await.unwrap();
        let pretty_json = pretty.render_backup(&backup).unwrap();
        let compact_json = compact.render_backup(&backup).unwrap();

        assert!(pretty_json.contains('\n'));
        assert!(!compact_json.contains('\n'));
        assert_eq!(
            serde_json::from_str::<Value>(&pretty_json).unwrap(),
            serde_json::from_str::<Value>(&compact_json).unwrap()
        );
    }

    #[test]
    fn test_preview_import_reports_bad_json() {
        let service = BackupService::with_registry(
            Arc::new(MemoryDocumentStore::new()),
            BackupConfig::default(),
            Arc::new(DateFieldRegistry::farm_default()),
        );

        let report = service.preview_import("{not json", "f1");
        assert!(!report.valid);
        assert!(report.errors[0].contains("not valid JSON"));
        assert!(report.preview.is_none());
    }
}
