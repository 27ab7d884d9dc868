//! Error types for the backup service

use thiserror::Error;

/// Result type for backup operations
pub type BackupResult<T> = Result<T, BackupError>;

/// Errors that can occur while exporting or importing a backup
#[derive(Error, Debug)]
pub enum BackupError {
    /// The backup file failed validation; nothing was written
    #[error("Backup file rejected: {}", .errors.join("; "))]
    Validation { errors: Vec<String> },

    #[error("Resource not found: {0}")]
    NotFound(String),

    /// The document store failed a read or write
    #[error("Document store error: {0}")]
    Store(String),

    #[error("Invalid configuration: {0}")]
    Configuration(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Data model error: {0}")]
    Types(#[from] herd_backup_types::BackupTypesError),
}
