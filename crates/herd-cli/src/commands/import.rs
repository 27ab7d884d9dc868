use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Args;
use colored::Colorize;
use herd_backup::{BackupService, ImportOptions, JsonDirStore};
use tracing::info;

use super::{print_report, read_backup_file, EngineArgs};

#[derive(Args)]
pub struct ImportCommand {
    #[command(flatten)]
    engine: EngineArgs,

    /// Document store directory
    #[arg(long, env = "HERD_DATA_DIR")]
    data_dir: PathBuf,

    /// Farm to import into
    #[arg(long)]
    farm_id: String,

    /// Backup file to import
    #[arg(long, short)]
    input: PathBuf,

    /// Validate and convert without writing anything
    #[arg(long)]
    dry_run: bool,

    /// Import even when the backup has warnings
    #[arg(long, short)]
    yes: bool,
}

impl ImportCommand {
    pub fn execute(self) -> anyhow::Result<()> {
        let config = self.engine.load_config()?;
        let store = Arc::new(JsonDirStore::new(&self.data_dir));
        let service = BackupService::new(store, config)?;

        let raw = read_backup_file(&self.input)?;
        let report = service.preview_import(&raw, &self.farm_id);
        print_report(&report);

        if !report.can_proceed() {
            anyhow::bail!("Refusing to import {}: the backup is invalid", self.input.display());
        }
        if report.has_warnings() && !self.yes && !self.dry_run {
            anyhow::bail!(
                "The backup has {} warnings; re-run with --yes to import anyway",
                report.warnings.len()
            );
        }

        let data: serde_json::Value = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse {}", self.input.display()))?;

        info!("Importing {} into farm {}", self.input.display(), self.farm_id);
        let rt = tokio::runtime::Runtime::new()?;
        let summary = rt
            .block_on(service.import_backup(
                &data,
                &self.farm_id,
                ImportOptions {
                    dry_run: self.dry_run,
                },
            ))
            .with_context(|| format!("Failed to import into farm {}", self.farm_id))?;

        let headline = if summary.dry_run {
            "✅ Dry run complete, nothing was written".bright_yellow()
        } else {
            "✅ Import complete".bright_green()
        };
        println!("{}", headline);
        println!(
            "  {} {}",
            "Farm restored:".bright_white(),
            if summary.farm_restored { "yes" } else { "no" }
        );
        println!(
            "  {} {} animals, {} breeding records, {} reminders, {} weight records, {} invitations",
            "Records:".bright_white(),
            summary.counts.animals,
            summary.counts.breeding_records,
            summary.counts.reminders,
            summary.counts.weight_records,
            summary.counts.farm_invitations
        );
        println!();

        Ok(())
    }
}
