//! `murmur-setup docker` — configure and start the containerized server.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::Args;
use murmur_config::ArtifactError;

use crate::app::AppContext;
use crate::application::services::collect::{CollectOptions, collect};
use crate::application::services::config_service;
use crate::application::services::install::{self, DockerOptions, SecretWait};
use crate::commands::interruptible;
use crate::domain::Mode;
use crate::domain::fields::{catalog, parse_overrides};
use crate::infra::firewall::HostFirewall;
use crate::infra::provisioner::HostProvisioner;
use crate::infra::service::ComposeService;
use crate::output::TerminalReporter;

#[derive(Args)]
pub struct DockerArgs {
    /// Compose file to configure [default: docker.compose_file]
    #[arg(long, value_name = "PATH")]
    pub compose_file: Option<PathBuf>,

    /// Write the bundled compose template if the file does not exist
    #[arg(long)]
    pub generate: bool,

    /// Answer a field up front (repeatable), e.g. --set port=4000
    #[arg(long = "set", value_name = "KEY=VALUE")]
    pub overrides: Vec<String>,

    /// Print the rewritten file and change nothing
    #[arg(long)]
    pub dry_run: bool,
}

/// Run the docker command.
pub async fn run(app: &AppContext, args: DockerArgs) -> Result<ExitCode> {
    let config = config_service::load_config(&app.config_store)?;
    let compose_file = args
        .compose_file
        .unwrap_or_else(|| config.docker.compose_file.clone());

    let fields = catalog(Mode::Docker, &config);
    let overrides = parse_overrides(&args.overrides, &fields)?;

    // fail before asking anything
    if !args.generate && !compose_file.exists() {
        return Err(ArtifactError::Missing(compose_file).into());
    }

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
        let content = install::preview(Mode::Docker, &compose_file, args.generate, &set)?;
        app.renderer().render_preview(&compose_file, &content)?;
        return Ok(ExitCode::SUCCESS);
    }

    let service = config.docker.service.as_str();
    let provisioner = HostProvisioner::default_runner();
    let firewall = HostFirewall::default_runner();
    let driver = ComposeService::default_runner(&compose_file, service);
    let opts = DockerOptions {
        reporter: &reporter,
        compose_file: &compose_file,
        service,
        generate: args.generate,
        secret_wait: SecretWait::default(),
    };

    let summary = interruptible(install::install_docker(
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
