//! Application service — the docker and native install pipelines.
//!
//! Imports only from `crate::domain`, `crate::application::ports` and the
//! configuration engine. All host I/O is routed through injected port traits.
//!
//! The artifact is backed up before it is rewritten. Any failure from the
//! rewrite up to the service check restores the backup; dropping the pipeline
//! future (Ctrl-C) restores it through the guard's `Drop`. A compose file
//! generated from the template by a run that does not complete is removed,
//! along with its backup.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use murmur_config::{
    ArtifactBackup, BackupNaming, ConfigurationSet, Protocol, RuleTable, artifact, compose, ini,
    keys,
};

use crate::application::ports::{
    NetworkExposer, ProgressReporter, Provisioner, SECRET_ATTEMPTS, SECRET_INTERVAL, ServiceDriver,
    SuperUserAdmin,
};
use crate::domain::summary::{SUPERUSER_PASSWORD_RE, superuser_fallback};
use crate::domain::{FirewallOutcome, InstallSummary, Mode, SecretOutcome, SetupError, SuperUserStatus};

/// Bounds of the SuperUser password poll.
#[derive(Debug, Clone, Copy)]
pub struct SecretWait {
    pub attempts: u32,
    pub interval: Duration,
}

impl Default for SecretWait {
    fn default() -> Self {
        Self {
            attempts: SECRET_ATTEMPTS,
            interval: SECRET_INTERVAL,
        }
    }
}

pub struct DockerOptions<'a, R: ProgressReporter> {
    pub reporter: &'a R,
    pub compose_file: &'a Path,
    /// Compose service name, for the manual fallback hint.
    pub service: &'a str,
    /// Write the bundled template first when the file does not exist.
    pub generate: bool,
    pub secret_wait: SecretWait,
}

pub struct NativeOptions<'a, R: ProgressReporter> {
    pub reporter: &'a R,
    pub ini_file: &'a Path,
    pub package: &'a str,
    /// systemd unit, for the manual fallback hint.
    pub service: &'a str,
    pub secret_wait: SecretWait,
}

/// Containerized install: template, rewrite, runtime, firewall, restart.
///
/// # Errors
///
/// Returns an error if the compose file is missing, a host step fails, or
/// the container is not running after the restart. The compose file is
/// restored from its backup on any failure after it was rewritten.
pub async fn install_docker<R: ProgressReporter>(
    opts: &DockerOptions<'_, R>,
    set: &ConfigurationSet,
    provisioner: &impl Provisioner,
    exposer: &impl NetworkExposer,
    driver: &impl ServiceDriver,
) -> Result<InstallSummary> {
    let reporter = opts.reporter;
    let path = opts.compose_file;
    set.ensure_complete()?;
    let port = port_of(set)?;

    let mut generated = Generated::default();
    if opts.generate && generate_template(path, reporter)? {
        generated.track(path);
    }
    let content = artifact::read(path)?;
    let table = compose::rules_for(&content);

    let guard = ArtifactBackup::create(path, BackupNaming::Fixed)?;
    reporter.step(&format!("Backed up {} to {}", path.display(), guard.path().display()));
    if generated.is_armed() {
        generated.track(guard.path());
    }

    let result = async {
        let changed = rewrite(path, &table, set, reporter)?;
        reporter.step("Checking container runtime...");
        provisioner
            .ensure_runtime_active()
            .await
            .context("preparing the container runtime")?;
        reporter.success("Container runtime ready");
        let firewall = open_port(exposer, reporter, port).await?;
        restart_and_verify(driver, reporter).await?;
        Ok::<_, anyhow::Error>((changed, firewall))
    }
    .await;
    let settled = settle(guard, result, reporter);
    if settled.is_err() && generated.is_armed() {
        reporter.warn(&format!("Removing generated {}", path.display()));
    }
    let ((changed, firewall), backup) = settled?;
    generated.keep();

    let superuser = await_secret(driver, reporter, opts.secret_wait, Mode::Docker, path, opts.service).await;
    let mut summary = InstallSummary::from_set(Mode::Docker, path.to_path_buf(), set, firewall, superuser);
    summary.backup = Some(backup);
    summary.changed = changed;
    Ok(summary)
}

/// Package install: package, rewrite, firewall, SuperUser password, restart.
///
/// # Errors
///
/// Returns an error if the package cannot be installed, the INI file is
/// missing afterwards, a host step fails, or the unit is not active after
/// the restart. The INI file is restored from its backup on any failure
/// after it was rewritten.
pub async fn install_native<R: ProgressReporter>(
    opts: &NativeOptions<'_, R>,
    set: &ConfigurationSet,
    provisioner: &impl Provisioner,
    exposer: &impl NetworkExposer,
    driver: &(impl ServiceDriver + SuperUserAdmin),
) -> Result<InstallSummary> {
    let reporter = opts.reporter;
    let path = opts.ini_file;
    set.ensure_complete()?;
    let port = port_of(set)?;

    reporter.step(&format!("Installing {}...", opts.package));
    provisioner
        .ensure_installed(opts.package)
        .await
        .with_context(|| format!("installing {}", opts.package))?;
    reporter.success(&format!("{} installed", opts.package));

    // the package ships the INI file; check for it only now
    artifact::read(path)?;
    let guard = ArtifactBackup::create(path, BackupNaming::Timestamped)?;
    reporter.step(&format!("Backed up {} to {}", path.display(), guard.path().display()));

    let superuser_password = set.value(keys::SUPERUSER_PASSWORD);
    let result = async {
        let changed = rewrite(path, &ini::rules(), set, reporter)?;
        let firewall = open_port(exposer, reporter, port).await?;
        if !superuser_password.is_empty() {
            driver
                .set_superuser_password(superuser_password)
                .await
                .context("setting the SuperUser password")?;
            reporter.success("SuperUser password set");
        }
        restart_and_verify(driver, reporter).await?;
        Ok::<_, anyhow::Error>((changed, firewall))
    }
    .await;
    let ((changed, firewall), backup) = settle(guard, result, reporter)?;

    let superuser = if superuser_password.is_empty() {
        await_secret(driver, reporter, opts.secret_wait, Mode::Native, path, opts.service).await
    } else {
        SuperUserStatus::Supplied
    };
    let mut summary = InstallSummary::from_set(Mode::Native, path.to_path_buf(), set, firewall, superuser);
    summary.backup = Some(backup);
    summary.changed = changed;
    Ok(summary)
}

/// The artifact as it would be written, without touching anything.
///
/// In docker mode with `generate` set and no compose file yet, the bundled
/// template is transformed instead.
///
/// # Errors
///
/// Returns an error if the set is incomplete or the artifact is missing.
pub fn preview(mode: Mode, path: &Path, generate: bool, set: &ConfigurationSet) -> Result<String> {
    set.ensure_complete()?;
    let content = if mode == Mode::Docker && generate && !path.exists() {
        compose::TEMPLATE.to_string()
    } else {
        artifact::read(path)?
    };
    let table = match mode {
        Mode::Docker => compose::rules_for(&content),
        Mode::Native => ini::rules(),
    };
    Ok(table.transform(&content, set)?)
}

fn port_of(set: &ConfigurationSet) -> Result<u16> {
    let raw = set.value(keys::PORT).trim();
    raw.parse()
        .map_err(|_| SetupError::InvalidInput {
            key: keys::PORT.to_string(),
            reason: format!("'{raw}' is not a port number (1-65535)"),
        })
        .map_err(Into::into)
}

/// Files this run created from scratch. Removed on drop unless kept, so a
/// failed or interrupted run leaves no compose file the operator never had.
#[derive(Default)]
struct Generated {
    paths: Vec<PathBuf>,
}

impl Generated {
    fn track(&mut self, path: &Path) {
        self.paths.push(path.to_path_buf());
    }

    fn is_armed(&self) -> bool {
        !self.paths.is_empty()
    }

    fn keep(mut self) {
        self.paths.clear();
    }
}

impl Drop for Generated {
    fn drop(&mut self) {
        for path in &self.paths {
            match std::fs::remove_file(path) {
                Ok(()) => tracing::info!(path = %path.display(), "removed generated file"),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => tracing::error!(path = %path.display(), error = %e, "could not remove generated file"),
            }
        }
    }
}

/// Write the bundled template; `false` when a file is already there.
fn generate_template(path: &Path, reporter: &impl ProgressReporter) -> Result<bool> {
    if path.exists() {
        reporter.warn(&format!("{} exists; keeping it", path.display()));
        return Ok(false);
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("cannot create {}", parent.display()))?;
    }
    artifact::write_atomic(path, compose::TEMPLATE.as_bytes())?;
    reporter.success(&format!("Generated {}", path.display()));
    Ok(true)
}

fn rewrite(
    path: &Path,
    table: &RuleTable,
    set: &ConfigurationSet,
    reporter: &impl ProgressReporter,
) -> Result<bool> {
    let changed = artifact::apply_to_file(path, table, set)?;
    if changed {
        reporter.success(&format!("Updated {}", path.display()));
    } else {
        reporter.success(&format!("{} already up to date", path.display()));
    }
    Ok(changed)
}

async fn open_port(
    exposer: &impl NetworkExposer,
    reporter: &impl ProgressReporter,
    port: u16,
) -> Result<FirewallOutcome> {
    reporter.step(&format!("Opening port {port}..."));
    let outcome = exposer
        .open_port(port, &[Protocol::Tcp, Protocol::Udp])
        .await
        .with_context(|| format!("opening port {port}"))?;
    match &outcome {
        FirewallOutcome::Opened { tool, .. } => {
            reporter.success(&format!("Port {port}/tcp and {port}/udp allowed ({tool})"));
        }
        FirewallOutcome::Skipped => reporter.warn(&format!(
            "No supported firewall found; make sure port {port} (TCP and UDP) is reachable"
        )),
    }
    Ok(outcome)
}

async fn restart_and_verify(
    driver: &impl ServiceDriver,
    reporter: &impl ProgressReporter,
) -> Result<()> {
    reporter.step("Restarting server...");
    driver.restart().await.context("restarting the server")?;
    if !driver.is_active().await.context("checking the server")? {
        return Err(SetupError::ServiceNotActive {
            service: "Mumble server".to_string(),
            hint: driver.inspect_hint(),
        }
        .into());
    }
    reporter.success("Server running");
    Ok(())
}

/// Commit the backup on success; restore it and pass the error on otherwise.
fn settle<T>(
    guard: ArtifactBackup,
    result: Result<T>,
    reporter: &impl ProgressReporter,
) -> Result<(T, PathBuf)> {
    match result {
        Ok(value) => Ok((value, guard.commit())),
        Err(e) => {
            let artifact = guard.artifact().to_path_buf();
            match guard.rollback() {
                Ok(backup) => {
                    tracing::info!(artifact = %artifact.display(), backup = %backup.display(), "restored");
                    reporter.warn(&format!("Restored {} from {}", artifact.display(), backup.display()));
                }
                Err(restore_err) => reporter.warn(&format!(
                    "Could not restore {}: {restore_err}",
                    artifact.display()
                )),
            }
            Err(e)
        }
    }
}

async fn await_secret(
    driver: &impl ServiceDriver,
    reporter: &impl ProgressReporter,
    wait: SecretWait,
    mode: Mode,
    artifact: &Path,
    service: &str,
) -> SuperUserStatus {
    reporter.step("Waiting for the generated SuperUser password...");
    match driver
        .wait_for_secret(&SUPERUSER_PASSWORD_RE, wait.attempts, wait.interval)
        .await
    {
        SecretOutcome::Found(password) => {
            reporter.success("SuperUser password found in the server log");
            SuperUserStatus::Extracted { password }
        }
        SecretOutcome::TimedOut => {
            reporter.warn("SuperUser password not seen in the server log");
            SuperUserStatus::Unconfirmed {
                fallback: superuser_fallback(mode, artifact, service),
            }
        }
    }
}
