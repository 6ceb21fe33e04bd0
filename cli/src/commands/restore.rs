//! `murmur-setup restore` — put a configuration file back from a backup.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Args;

use crate::app::AppContext;

#[derive(Args)]
pub struct RestoreArgs {
    /// Configuration file to overwrite
    #[arg(long, value_name = "PATH")]
    pub file: PathBuf,

    /// Backup to copy from
    #[arg(long, value_name = "PATH")]
    pub backup: PathBuf,
}

/// Run the restore command.
pub fn run(app: &AppContext, args: &RestoreArgs) -> Result<ExitCode> {
    let prompt = format!(
        "Overwrite {} with {}?",
        args.file.display(),
        args.backup.display()
    );
    if !app.confirm(&prompt, true)? {
        app.output.info("Nothing changed.");
        return Ok(ExitCode::SUCCESS);
    }

    murmur_config::backup::restore(&args.backup, &args.file)
        .with_context(|| format!("restoring {}", args.file.display()))?;
    tracing::info!(file = %args.file.display(), backup = %args.backup.display(), "restored");

    app.renderer().render_restored(&args.file, &args.backup)?;
    Ok(ExitCode::SUCCESS)
}
