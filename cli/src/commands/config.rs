//! `murmur-setup config` — show and set installer defaults.

use std::process::ExitCode;

use anyhow::Result;
use clap::Subcommand;

use crate::app::AppContext;
use crate::application::ports::ConfigStore;
use crate::application::services::config_service;

/// Config subcommands.
#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show,
    /// Set configuration value
    Set {
        /// Configuration key, e.g. defaults.port
        key: String,
        /// Configuration value
        value: String,
    },
    /// Print the configuration file location
    Path,
}

/// Run the config command.
pub fn run(app: &AppContext, cmd: ConfigCommand) -> Result<ExitCode> {
    match cmd {
        ConfigCommand::Show => show_config(app),
        ConfigCommand::Set { key, value } => set_config(app, &key, &value),
        ConfigCommand::Path => {
            app.renderer()
                .render_config_path(&app.config_store.path()?)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn show_config(app: &AppContext) -> Result<ExitCode> {
    let config = config_service::load_config(&app.config_store)?;
    let path = app.config_store.path()?;
    app.renderer().render_config(&config, &path)?;
    Ok(ExitCode::SUCCESS)
}

fn set_config(app: &AppContext, key: &str, value: &str) -> Result<ExitCode> {
    config_service::set_value(&app.config_store, key, value)?;
    app.renderer().render_config_set(&app.output, key, value)?;
    Ok(ExitCode::SUCCESS)
}
