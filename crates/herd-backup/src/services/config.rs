//! Backup service configuration types

use std::path::{Path, PathBuf};
use std::sync::Arc;

use herd_backup_types::BACKUP_VERSION;
use serde::{Deserialize, Serialize};

use crate::error::BackupResult;
use crate::registry::DateFieldRegistry;
use crate::serializer::DateEncoding;

/// Default for pretty-printed backup files
pub const DEFAULT_PRETTY_OUTPUT: bool = true;

// Helper functions for serde defaults
fn default_supported_version() -> u32 {
    BACKUP_VERSION
}

fn default_pretty_output() -> bool {
    DEFAULT_PRETTY_OUTPUT
}

/// Configuration for exporting and importing backups
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupConfig {
    /// Backup format version written on export and required on import
    #[serde(default = "default_supported_version")]
    pub supported_version: u32,

    /// How instants are written into backup files
    #[serde(default)]
    pub date_encoding: DateEncoding,

    /// Indent exported JSON
    #[serde(default = "default_pretty_output")]
    pub pretty_output: bool,

    /// Date field registry to load instead of the built-in farm table
    #[serde(default)]
    pub registry_path: Option<PathBuf>,
}

impl Default for BackupConfig {
    fn default() -> Self {
        Self {
            supported_version: default_supported_version(),
            date_encoding: DateEncoding::default(),
            pretty_output: default_pretty_output(),
            registry_path: None,
        }
    }
}

impl BackupConfig {
    /// Read configuration from a JSON file; absent keys take their defaults
    pub fn from_json_file(path: impl AsRef<Path>) -> BackupResult<Self> {
        let json = std::fs::read_to_string(path.as_ref())?;
        Ok(serde_json::from_str(&json)?)
    }

    /// Resolve the date field registry this configuration points at
    pub fn registry(&self) -> BackupResult<Arc<DateFieldRegistry>> {
        let registry = match &self.registry_path {
            Some(path) => DateFieldRegistry::from_json_file(path)?,
            None => DateFieldRegistry::farm_default(),
        };
        Ok(Arc::new(registry))
    }
}
