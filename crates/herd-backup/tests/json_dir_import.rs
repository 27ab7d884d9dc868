//! Export and import against the directory-backed store.

use std::sync::Arc;

use herd_backup::{
    BackupConfig, BackupError, BackupService, DocumentStore, ImportOptions, JsonDirStore,
};
use herd_backup_types::{DocValue, Timestamp};
use serde_json::{json, Value};

async fn seed(store: &JsonDirStore) {
    let documents = [
        (
            "farms",
            "f1",
            json!({"name": "Green Acres", "createdAt": {"_seconds": 1_600_000_000i64, "_nanoseconds": 0}}),
        ),
        (
            "animals",
            "a1",
            json!({
                "farmId": "f1",
                "name": "Bella",
                "birthDate": {"_seconds": 1_577_836_800i64, "_nanoseconds": 0},
                "healthRecords": [
                    {"date": {"_seconds": 1_622_536_200i64, "_nanoseconds": 0}, "nextDueDate": null}
                ]
            }),
        ),
        (
            "breedingRecords",
            "b1",
            json!({"farmId": "f1", "breedingDate": {"_seconds": 1_680_307_200i64, "_nanoseconds": 0}}),
        ),
        (
            "weightRecords",
            "w1",
            json!({"farmId": "f1", "weightKg": 480, "date": {"_seconds": 1_700_000_000i64, "_nanoseconds": 0}}),
        ),
        (
            "farmInvitations",
            "i1",
            json!({"farmId": "f1", "email": "hand@example.com", "acceptedAt": null}),
        ),
        ("animals", "x1", json!({"farmId": "f2", "name": "Neighbour's"})),
    ];
    for (collection, id, body) in documents {
        store
            .put_document(collection, id, DocValue::from_stored(body))
            .await
            .unwrap();
    }
}

fn service(store: &Arc<JsonDirStore>) -> BackupService {
    BackupService::new(store.clone(), BackupConfig::default()).unwrap()
}

#[tokio::test]
async fn exported_file_restores_into_an_empty_directory() {
    let source_dir = tempfile::tempdir().unwrap();
    let source = Arc::new(JsonDirStore::new(source_dir.path()));
    seed(&source).await;

    let json = service(&source)
        .export_backup_json("f1", "owner@example.com")
        .await
        .unwrap();
    let data: Value = serde_json::from_str(&json).unwrap();

    assert_eq!(data["_meta"]["counts"]["animals"], 1);
    assert_eq!(data["_meta"]["counts"]["reminders"], 0);
    assert_eq!(data["reminders"], json!([]));
    assert_eq!(data["animals"][0]["birthDate"], "2020-01-01T00:00:00.000Z");

    let destination_dir = tempfile::tempdir().unwrap();
    let destination = Arc::new(JsonDirStore::new(destination_dir.path()));
    let report = service(&destination).preview_import(&json, "f1");
    assert!(report.valid);
    assert!(report.warnings.is_empty());

    service(&destination)
        .import_backup(&data, "f1", ImportOptions::default())
        .await
        .unwrap();

    for (collection, id) in [
        ("farms", "f1"),
        ("animals", "a1"),
        ("breedingRecords", "b1"),
        ("weightRecords", "w1"),
        ("farmInvitations", "i1"),
    ] {
        assert_eq!(
            destination.get_document(collection, id).await.unwrap(),
            source.get_document(collection, id).await.unwrap(),
            "{}/{}",
            collection,
            id
        );
    }
    assert!(destination.get_document("animals", "x1").await.unwrap().is_none());

    let on_disk: Value = serde_json::from_slice(
        &std::fs::read(destination_dir.path().join("animals").join("a1.json")).unwrap(),
    )
    .unwrap();
    assert_eq!(on_disk["birthDate"]["_seconds"], 1_577_836_800i64);
    assert!(on_disk.get("id").is_none());
}

#[tokio::test]
async fn rejected_file_leaves_directory_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(JsonDirStore::new(dir.path()));

    let data = json!({
        "_meta": {"version": 1, "farmId": "f1"},
        "farm": {"name": "Green Acres"},
        "animals": {"a1": {"name": "Bella"}}
    });
    let result = service(&store)
        .import_backup(&data, "f1", ImportOptions::default())
        .await;

    assert!(matches!(result, Err(BackupError::Validation { .. })));
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn partial_backup_imports_what_it_has() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(JsonDirStore::new(dir.path()));

    let data = json!({
        "_meta": {"version": 1, "farmId": "old-farm"},
        "farm": {"id": "old-farm", "name": "Green Acres"},
        "reminders": [
            {"id": "r1", "farmId": "old-farm", "dueDate": "2024-03-01T09:00:00.000Z"}
        ]
    });
    let summary = service(&store)
        .import_backup(&data, "new-farm", ImportOptions::default())
        .await
        .unwrap();

    // exportDate, four absent collections, farm mismatch
    assert_eq!(summary.warnings.len(), 6);
    assert_eq!(summary.counts.reminders, 1);
    assert_eq!(summary.counts.animals, 0);

    let reminder = store.get_document("reminders", "r1").await.unwrap().unwrap();
    assert_eq!(reminder.get("farmId").and_then(DocValue::as_str), Some("new-farm"));
    assert_eq!(
        reminder.get("dueDate").and_then(DocValue::as_timestamp),
        Some(Timestamp::new(1_709_283_600, 0).unwrap())
    );

    let farm = store.get_document("farms", "new-farm").await.unwrap().unwrap();
    assert_eq!(farm.get("name").and_then(DocValue::as_str), Some("Green Acres"));
    assert!(farm.get("id").is_none());
}
