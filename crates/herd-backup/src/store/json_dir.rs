//! Directory-backed document store
//!
//! One pretty-printed JSON file per document at `<root>/<collection>/<id>.json`.
//! Timestamps are written in the store's `{"_seconds", "_nanoseconds"}` form.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use herd_backup_types::DocValue;
use tracing::{debug, warn};

use super::{belongs_to_farm, DocumentStore};
use crate::error::{BackupError, BackupResult};

const DOCUMENT_EXTENSION: &str = "json";

/// Document store persisted as a directory tree of JSON files
#[derive(Debug, Clone)]
pub struct JsonDirStore {
    root: PathBuf,
}

impl JsonDirStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn collection_dir(&self, collection: &str) -> BackupResult<PathBuf> {
        check_segment("collection", collection)?;
        Ok(self.root.join(collection))
    }

    fn document_path(&self, collection: &str, id: &str) -> BackupResult<PathBuf> {
        check_segment("document id", id)?;
        Ok(self
            .collection_dir(collection)?
            .join(format!("{}.{}", id, DOCUMENT_EXTENSION)))
    }

    async fn read_document(path: &Path) -> BackupResult<DocValue> {
        let bytes = tokio::fs::read(path).await?;
        let value: serde_json::Value = serde_json::from_slice(&bytes).map_err(|e| {
            BackupError::Store(format!("Failed to parse {}: {}", path.display(), e))
        })?;
        Ok(DocValue::from_stored(value))
    }
}

/// Ids and collection names become path segments; keep them inside the root
fn check_segment(kind: &str, segment: &str) -> BackupResult<()> {
    let invalid = segment.is_empty()
        || segment == "."
        || segment == ".."
        || segment.contains(['/', '\\', '\0']);

    if invalid {
        return Err(BackupError::Store(format!(
            "Invalid {} for file store: '{}'",
            kind, segment
        )));
    }
    Ok(())
}

#[async_trait]
impl DocumentStore for JsonDirStore {
    async fn get_document(&self, collection: &str, id: &str) -> BackupResult<Option<DocValue>> {
        let path = self.document_path(collection, id)?;
        if !tokio::fs::try_exists(&path).await? {
            return Ok(None);
        }
        Self::read_document(&path).await.map(Some)
    }

    async fn list_documents(
        &self,
        collection: &str,
        farm_id: &str,
    ) -> BackupResult<Vec<(String, DocValue)>> {
        let dir = self.collection_dir(collection)?;
        if !tokio::fs::try_exists(&dir).await? {
            debug!("Collection directory {} does not exist", dir.display());
            return Ok(Vec::new());
        }

        let mut documents = Vec::new();
        let mut entries = tokio::fs::read_dir(&dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(DOCUMENT_EXTENSION) {
                continue;
            }
            let Some(id) = path.file_stem().and_then(|s| s.to_str()).map(str::to_string) else {
                warn!("Skipping file with non UTF-8 name: {}", path.display());
                continue;
            };

            let document = Self::read_document(&path).await?;
            if belongs_to_farm(&document, farm_id) {
                documents.push((id, document));
            }
        }

        documents.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(documents)
    }

    async fn put_document(
        &self,
        collection: &str,
        id: &str,
        document: DocValue,
    ) -> BackupResult<()> {
        let path = self.document_path(collection, id)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let json = serde_json::to_vec_pretty(&document.to_stored())?;
        tokio::fs::write(&path, json).await?;
        debug!("Wrote {}/{}", collection, id);
        Ok(())
    }
}
