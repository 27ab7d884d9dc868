//! In-memory document store

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use herd_backup_types::DocValue;
use tokio::sync::RwLock;

use super::{belongs_to_farm, DocumentStore};
use crate::error::BackupResult;

/// Document store held in memory, keyed by collection then id
#[derive(Debug, Default)]
pub struct MemoryDocumentStore {
    collections: RwLock<HashMap<String, BTreeMap<String, DocValue>>>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of documents in a collection
    pub async fn count(&self, collection: &str) -> usize {
        self.collections
            .read()
            .await
            .get(collection)
            .map(BTreeMap::len)
            .unwrap_or(0)
    }

    /// Copy of every document, for assertions
    pub async fn snapshot(&self) -> HashMap<String, BTreeMap<String, DocValue>> {
        self.collections.read().await.clone()
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn get_document(&self, collection: &str, id: &str) -> BackupResult<Option<DocValue>> {
        Ok(self
            .collections
            .read()
            .await
            .get(collection)
            .and_then(|docs| docs.get(id))
            .cloned())
    }

    async fn list_documents(
        &self,
        collection: &str,
        farm_id: &str,
    ) -> BackupResult<Vec<(String, DocValue)>> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .map(|docs| {
                docs.iter()
                    .filter(|(_, doc)| belongs_to_farm(doc, farm_id))
                    .map(|(id, doc)| (id.clone(), doc.clone()))
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn put_document(
        &self,
        collection: &str,
        id: &str,
        document: DocValue,
    ) -> BackupResult<()> {
        self.collections
            .write()
            .await
            .entry(collection.to_string())
            .or_default()
            .insert(id.to_string(), document);
        Ok(())
    }
}
