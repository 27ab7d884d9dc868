//! Core types for the Herd backup engine
//!
//! This crate provides the data model shared by the export/import engine and
//! its callers: the document store's native timestamp, the in-memory document
//! tree, the backup file layout and the validation report.
//!
//! # Architecture
//!
//! - **Timestamp**: the document store's point-in-time type
//! - **DocValue**: native document graph as handed out by the store
//! - **Backup file**: `_meta` header plus one entry per known collection
//! - **Validation**: error/warning report produced before any import
//!
//! # Usage
//!
//! The engine (`herd-backup`) depends on this crate; the CLI and the web
//! application consume the report and meta types directly.

pub mod backup_file;
pub mod error;
pub mod timestamp;
pub mod validation;
pub mod value;

pub use backup_file::{
    BackupCounts, BackupFile, BackupMeta, Collection, MetaPreview, BACKUP_VERSION, META_KEY,
};
pub use error::{BackupTypesError, BackupTypesResult};
pub use timestamp::Timestamp;
pub use validation::{ValidationLevel, ValidationReport};
pub use value::{DocValue, Document};
