//! herd-backup: farm backup export/import engine
//!
//! Converts the document store's native timestamps into portable JSON on
//! export, restores them on import by field name, and validates backup files
//! before anything is written.

pub mod deserializer;
pub mod error;
pub mod registry;
pub mod serializer;
pub mod services;
pub mod store;
pub mod temporal;
pub mod validator;

pub use deserializer::{deserialize_from_backup, looks_like_iso_date, TreeDeserializer};
pub use error::{BackupError, BackupResult};
pub use registry::DateFieldRegistry;
pub use serializer::{serialize_for_backup, DateEncoding, TreeSerializer};
pub use services::{BackupConfig, BackupService, ImportOptions, ImportSummary};
pub use store::{DocumentStore, JsonDirStore, MemoryDocumentStore};
pub use temporal::TemporalValue;
pub use validator::{validate_backup_file, BackupValidator};
