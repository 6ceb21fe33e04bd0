//! `murmur-setup native` — install the packaged server and configure its INI.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::Args;

use crate::app::AppContext;
use crate::application::services::collect::{CollectOptions, collect};
use crate::application::services::config_service;
use crate::application::services::install::{self, NativeOptions, SecretWait};
use crate::commands::interruptible;
use crate::domain::Mode;
use crate::domain::fields::{catalog, parse_overrides};
use crate::infra::firewall::HostFirewall;
use crate::infra::provisioner::HostProvisioner;
use crate::infra::service::SystemdService;
use crate::output::TerminalReporter;

#[derive(Args)]
pub struct NativeArgs {
    /// INI file to configure [default: native.ini_file]
    #[arg(long, value_name = "PATH")]
    pub ini_file: Option<PathBuf>,

    /// Answer a field up front (repeatable), e.g. --set max_users=50
    #[arg(long = "set", value_name = "KEY=VALUE")]
    pub overrides: Vec<String>,

    /// Print the rewritten file and change nothing
    #[arg(long)]
    pub dry_run: bool,
}

/// Run the native command.
pub async fn run(app: &AppContext, args: NativeArgs) -> Result<ExitCode> {
    let config = config_service::load_config(&app.config_store)?;
    let ini_file = args
        .ini_file
        .unwrap_or_else(|| config.native.ini_file.clone());

    let fields = catalog(Mode::Native, &config);
    let overrides = parse_overrides(&args.overrides, &fields)?;

    let reporter = TerminalReporter::new(&app.output);
    let set = collect(
        &fields,
        &app.prompter,
        &CollectOptions {
            reporter: &reporter,
            overrides: &overrides,
            non_interactive: app.non_interactive,
        },
    )?;

    if args.dry_run {
        let content = install::preview(Mode::Native, &ini_file, false, &set)?;
        app.renderer().render_preview(&ini_file, &content)?;
        return Ok(ExitCode::SUCCESS);
    }

    let service = config.native.service.as_str();
    let provisioner = HostProvisioner::default_runner();
    let firewall = HostFirewall::default_runner();
    let driver = SystemdService::default_runner(&ini_file, service);
    let opts = NativeOptions {
        reporter: &reporter,
        ini_file: &ini_file,
        package: &config.native.package,
        service,
        secret_wait: SecretWait::default(),
    };

    let summary = interruptible(install::install_native(
        &opts,
        &set,
        &provisioner,
        &firewall,
        &driver,
    ))
    .await?;
    drop(reporter);
    app.renderer().render_summary(&summary)?;
    Ok(ExitCode::SUCCESS)
}
