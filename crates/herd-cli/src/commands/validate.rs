use std::path::PathBuf;

use clap::Args;
use colored::Colorize;
use herd_backup::BackupValidator;

use super::{print_report, read_backup_file, EngineArgs};

#[derive(Args)]
pub struct ValidateCommand {
    #[command(flatten)]
    engine: EngineArgs,

    /// Farm the backup would be imported into
    #[arg(long)]
    farm_id: String,

    /// Backup file to check
    #[arg(long, short)]
    input: PathBuf,
}

impl ValidateCommand {
    pub fn execute(self) -> anyhow::Result<()> {
        let config = self.engine.load_config()?;
        let raw = read_backup_file(&self.input)?;

        let report =
            BackupValidator::new(config.supported_version).validate_json(&raw, &self.farm_id);
        print_report(&report);

        if !report.valid {
            anyhow::bail!(
                "{} is not a valid backup ({} errors)",
                self.input.display(),
                report.errors.len()
            );
        }

        println!("{}", "✅ Backup file is valid".bright_green());
        println!();
        Ok(())
    }
}
