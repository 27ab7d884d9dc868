//! Backup service implementation
//!
//! Ties the engine together over a document store: export reads a farm into a
//! backup file, import validates one and writes it back.

mod backup;
mod config;

pub use backup::{BackupService, ImportOptions, ImportSummary, DOCUMENT_ID_FIELD};
pub use config::{BackupConfig, DEFAULT_PRETTY_OUTPUT};
