use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Args;
use colored::Colorize;
use herd_backup::{BackupService, JsonDirStore};
use tracing::info;

use super::EngineArgs;

#[derive(Args)]
pub struct ExportCommand {
    #[command(flatten)]
    engine: EngineArgs,

    /// Document store directory
    #[arg(long, env = "HERD_DATA_DIR")]
    data_dir: PathBuf,

    /// Farm to export
    #[arg(long)]
    farm_id: String,

    /// Recorded in the backup as the user who ran the export
    #[arg(long, env = "USER", default_value = "herd-cli")]
    exported_by: String,

    /// Write the backup here instead of stdout
    #[arg(long, short)]
    output: Option<PathBuf>,
}

impl ExportCommand {
    pub fn execute(self) -> anyhow::Result<()> {
        let config = self.engine.load_config()?;

        let store = Arc::new(JsonDirStore::new(&self.data_dir));
        let service = BackupService::new(store, config)?;

        let rt = tokio::runtime::Runtime::new()?;
        let backup = rt
            .block_on(service.export_backup(&self.farm_id, &self.exported_by))
            .with_context(|| format!("Failed to export farm {}", self.farm_id))?;

        let json = service.render_backup(&backup)?;

        let Some(output) = &self.output else {
            println!("{}", json);
            return Ok(());
        };

        std::fs::write(output, json)
            .with_context(|| format!("Failed to write backup to {}", output.display()))?;
        info!("Backup written to {}", output.display());

        println!();
        println!(
            "{} {}",
            "✅ Exported farm".bright_green(),
            backup.meta.farm_name.bright_cyan()
        );
        println!("  {} {}", "File:".bright_white(), output.display());
        println!(
            "  {} {}",
            "Records:".bright_white(),
            backup.meta.counts.total().to_string().bright_cyan()
        );
        println!();

        Ok(())
    }
}
