pub mod export;
pub mod import;
pub mod validate;

pub use export::ExportCommand;
pub use import::ImportCommand;
pub use validate::ValidateCommand;

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Args;
use colored::Colorize;
use herd_backup::{BackupConfig, DateEncoding};
use herd_backup_types::ValidationReport;

/// Engine settings shared by every command
#[derive(Args, Debug, Clone)]
pub struct EngineArgs {
    /// Backup configuration file (JSON)
    #[arg(long, env = "HERD_CONFIG")]
    config: Option<PathBuf>,

    /// Date field registry file (JSON); overrides the configuration's
    #[arg(long, env = "HERD_DATE_REGISTRY")]
    registry: Option<PathBuf>,

    /// Write and read instants as {"$date": ...} instead of bare ISO strings
    #[arg(long)]
    tagged_dates: bool,
}

impl EngineArgs {
    pub fn load_config(&self) -> anyhow::Result<BackupConfig> {
        let mut config = match &self.config {
            Some(path) => BackupConfig::from_json_file(path)
                .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
            None => BackupConfig::default(),
        };
        if let Some(registry) = &self.registry {
            config.registry_path = Some(registry.clone());
        }
        if self.tagged_dates {
            config.date_encoding = DateEncoding::Tagged;
        }
        Ok(config)
    }
}

/// Print a validation report the way every command shows it
pub fn print_report(report: &ValidationReport) {
    if let Some(preview) = &report.preview {
        println!();
        println!("{}", "Backup".bright_white().bold());
        println!(
            "  {} {}",
            "Farm:".bright_white(),
            format!(
                "{} ({})",
                preview.farm_name.as_deref().unwrap_or("unnamed"),
                preview.farm_id.as_deref().unwrap_or("unknown id")
            )
            .bright_cyan()
        );
        println!(
            "  {} {}",
            "Exported:".bright_white(),
            preview.export_date.as_deref().unwrap_or("unknown")
        );
        println!(
            "  {} {}",
            "Exported by:".bright_white(),
            preview.exported_by.as_deref().unwrap_or("unknown")
        );
        println!(
            "  {} {}",
            "Version:".bright_white(),
            preview
                .version
                .map(|v| v.to_string())
                .unwrap_or_else(|| "unknown".to_string())
        );
        println!(
            "  {} {} animals, {} breeding records, {} reminders, {} weight records, {} invitations",
            "Records:".bright_white(),
            preview.counts.animals,
            preview.counts.breeding_records,
            preview.counts.reminders,
            preview.counts.weight_records,
            preview.counts.farm_invitations
        );
    }

    if !report.errors.is_empty() {
        println!();
        for error in &report.errors {
            println!("  {} {}", "error:".bright_red().bold(), error);
        }
    }
    if !report.warnings.is_empty() {
        println!();
        for warning in &report.warnings {
            println!("  {} {}", "warning:".bright_yellow().bold(), warning);
        }
    }
    println!();
}

pub fn read_backup_file(path: &Path) -> anyhow::Result<String> {
    std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read backup file {}", path.display()))
}
