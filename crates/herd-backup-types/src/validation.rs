//! Validation types for pre-import checks

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::backup_file::MetaPreview;

/// Validation severity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ValidationLevel {
    /// Recoverable degradation the operator can accept
    Warning,
    /// Data integrity cannot be guaranteed, import is refused
    Error,
}

/// Outcome of validating a backup file against its destination farm
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ValidationReport {
    /// True when no errors were found, whatever the warning count
    pub valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    /// What the file claims to be; present whenever a `_meta` block was found
    pub preview: Option<MetaPreview>,
}

impl ValidationReport {
    /// Create a new empty validation report
    pub fn new() -> Self {
        Self {
            valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
            preview: None,
        }
    }

    /// Report with a single blocking error and no preview
    pub fn rejected(message: impl Into<String>) -> Self {
        let mut report = Self::new();
        report.add_error(message);
        report
    }

    pub fn add(&mut self, level: ValidationLevel, message: impl Into<String>) {
        match level {
            ValidationLevel::Warning => self.warnings.push(message.into()),
            ValidationLevel::Error => {
                self.errors.push(message.into());
                self.valid = false;
            }
        }
    }

    pub fn add_error(&mut self, message: impl Into<String>) {
        self.add(ValidationLevel::Error, message);
    }

    pub fn add_warning(&mut self, message: impl Into<String>) {
        self.add(ValidationLevel::Warning, message);
    }

    /// Check if the import may go ahead (no errors)
    pub fn can_proceed(&self) -> bool {
        self.valid
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

impl Default for ValidationReport {
    fn default() -> Self {
        Self::new()
    }
}
