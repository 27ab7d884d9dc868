//! Error types for the backup data model

use thiserror::Error;

/// Result type for data model operations
pub type BackupTypesResult<T> = Result<T, BackupTypesError>;

/// Errors raised while building data model values
#[derive(Error, Debug)]
pub enum BackupTypesError {
    /// Seconds/nanoseconds pair outside the representable range
    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),

    /// Collection name not part of the backup layout
    #[error("Unknown collection: {0}")]
    UnknownCollection(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
