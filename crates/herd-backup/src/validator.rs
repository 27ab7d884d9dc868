//! Backup file validator
//!
//! Runs on every file before any of its contents reach the document store.
//! Problems are split in two tiers: errors refuse the import outright,
//! warnings describe degradations the operator may knowingly accept.

use herd_backup_types::{Collection, MetaPreview, ValidationReport, BACKUP_VERSION, META_KEY};
use serde_json::Value;
use tracing::debug;

/// Structural checks for backup files
#[derive(Debug, Clone, Copy)]
pub struct BackupValidator {
    supported_version: u32,
}

impl BackupValidator {
    pub fn new(supported_version: u32) -> Self {
        Self { supported_version }
    }

    /// Validate a parsed backup file against the farm it will be imported into
    pub fn validate(&self, data: &Value, current_farm_id: &str) -> ValidationReport {
        let Some(root) = data.as_object() else {
            return ValidationReport::rejected("Backup file must be a JSON object");
        };

        let Some(meta) = root.get(META_KEY).and_then(Value::as_object) else {
            return ValidationReport::rejected(format!(
                "Backup file is missing its {} block or it is not an object",
                META_KEY
            ));
        };

        let mut report = ValidationReport::new();
        report.preview = Some(MetaPreview::from_meta_object(meta));

        let version = meta.get("version");
        if !version.is_some_and(|v| self.is_supported_version(v)) {
            report.add_error(format!(
                "Unsupported backup version: {} (expected {})",
                version.map(Value::to_string).unwrap_or_else(|| "missing".to_string()),
                self.supported_version
            ));
        }

        let farm_id = meta.get("farmId").and_then(Value::as_str);
        if farm_id.is_none() {
            report.add_error("Backup metadata farmId is missing or not a string");
        }

        if !meta.get("exportDate").is_some_and(Value::is_string) {
            report.add_warning("Backup metadata exportDate is missing; export date unknown");
        }

        if !root.get(Collection::Farms.backup_key()).is_some_and(Value::is_object) {
            report.add_error("Backup is missing the farm document or it is not an object");
        }

        for collection in Collection::RECORDS {
            match root.get(collection.backup_key()) {
                None => report.add_warning(format!(
                    "Collection '{}' is missing from the backup and will be skipped",
                    collection.backup_key()
                )),
                Some(Value::Array(_)) => {}
                Some(_) => report.add_error(format!(
                    "Collection '{}' must be an array",
                    collection.backup_key()
                )),
            }
        }

        if let Some(farm_id) = farm_id {
            if farm_id != current_farm_id {
                report.add_warning(format!(
                    "Backup was exported from farm '{}' but is being imported into farm '{}'",
                    farm_id, current_farm_id
                ));
            }
        }

        debug!(
            valid = report.valid,
            errors = report.errors.len(),
            warnings = report.warnings.len(),
            "Validated backup file"
        );

        report
    }

    /// Parse backup text and validate it. Unparseable text yields a
    /// rejected report rather than an error.
    pub fn validate_json(&self, raw_json: &str, current_farm_id: &str) -> ValidationReport {
        match serde_json::from_str::<Value>(raw_json) {
            Ok(data) => self.validate(&data, current_farm_id),
            Err(e) => ValidationReport::rejected(format!("Backup file is not valid JSON: {}", e)),
        }
    }

    /// Any JSON number equal to the supported version; `1.0` counts as `1`
    fn is_supported_version(&self, version: &Value) -> bool {
        version.as_f64() == Some(f64::from(self.supported_version))
    }
}

impl Default for BackupValidator {
    fn default() -> Self {
        Self::new(BACKUP_VERSION)
    }
}

/// Validate against the current backup version
pub fn validate_backup_file(data: &Value, current_farm_id: &str) -> ValidationReport {
    BackupValidator::default().validate(data, current_farm_id)
}
