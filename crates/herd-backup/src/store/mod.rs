//! Document store abstraction
//!
//! The engine never talks to the database directly. Export reads through
//! this trait and import writes through it.

mod json_dir;
mod memory;

pub use json_dir::JsonDirStore;
pub use memory::MemoryDocumentStore;

use async_trait::async_trait;
use herd_backup_types::DocValue;

use crate::error::BackupResult;

/// Field linking a record document to its farm
pub const FARM_ID_FIELD: &str = "farmId";

/// Key-value document store addressed by collection name and document id
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Read one document
    async fn get_document(&self, collection: &str, id: &str) -> BackupResult<Option<DocValue>>;

    /// Read every document of a collection belonging to a farm, as (id, body)
    async fn list_documents(
        &self,
        collection: &str,
        farm_id: &str,
    ) -> BackupResult<Vec<(String, DocValue)>>;

    /// Create or overwrite a document
    async fn put_document(&self, collection: &str, id: &str, document: DocValue)
        -> BackupResult<()>;
}

pub(crate) fn belongs_to_farm(document: &DocValue, farm_id: &str) -> bool {
    document.get(FARM_ID_FIELD).and_then(DocValue::as_str) == Some(farm_id)
}
