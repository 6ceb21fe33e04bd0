//! CLI argument parsing with clap derive

use std::process::ExitCode;

use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};

use crate::app::{AppContext, AppFlags, BehaviourFlags, OutputFlags};
use crate::commands;

/// Interactive installer and configurator for a Mumble voice server
#[derive(Parser)]
#[command(
    name = "murmur-setup",
    version,
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    pub no_color: bool,

    /// Never prompt; use --set values and defaults
    #[arg(short, long, global = true)]
    pub yes: bool,

    /// More diagnostic output on stderr (-v debug, -vv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Configure and start the server as a docker compose service
    Docker(commands::docker::DockerArgs),

    /// Install the distribution package and configure its INI file
    Native(commands::native::NativeArgs),

    /// Put a configuration file back from one of its backups
    Restore(commands::restore::RestoreArgs),

    /// Manage installer defaults
    #[command(subcommand)]
    Config(commands::config::ConfigCommand),

    /// Show version
    Version,
}

impl Cli {
    /// Execute the CLI command.
    ///
    /// # Errors
    ///
    /// Returns an error if the command fails.
    pub async fn run(self) -> Result<ExitCode> {
        let Cli {
            json,
            quiet,
            no_color,
            yes,
            command,
            ..
        } = self;
        let app = AppContext::new(&AppFlags {
            output: OutputFlags {
                no_color,
                quiet,
                json,
            },
            behaviour: BehaviourFlags { yes },
        });

        match command {
            Command::Docker(args) => commands::docker::run(&app, args).await,
            Command::Native(args) => commands::native::run(&app, args).await,
            Command::Restore(args) => commands::restore::run(&app, &args),
            Command::Config(cmd) => commands::config::run(&app, cmd),
            Command::Version => {
                commands::version::run(&app);
                Ok(ExitCode::SUCCESS)
            }
        }
    }
}
