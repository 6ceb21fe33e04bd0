//! Port trait definitions for the Application layer.
//!
//! Ports are the interfaces (contracts) that infrastructure must fulfill.
//! This file imports only from `crate::domain` — never from `crate::infra`,
//! `crate::commands`, or `crate::output`.

use std::path::PathBuf;
use std::process::Output;
use std::time::Duration;

use anyhow::Result;
use murmur_config::Protocol;
use regex::Regex;

use crate::domain::config::InstallerConfig;
use crate::domain::summary::extract_secret;
use crate::domain::{FirewallOutcome, SecretOutcome};

// ── Constants ─────────────────────────────────────────────────────────────────

/// Log polls before the secret wait gives up.
pub const SECRET_ATTEMPTS: u32 = 30;

/// Delay between log polls.
pub const SECRET_INTERVAL: Duration = Duration::from_secs(2);

// ── Command Runner Port ───────────────────────────────────────────────────────

/// Abstracts process execution so infrastructure can be swapped or mocked.
#[allow(async_fn_in_trait)]
pub trait CommandRunner {
    /// Run a program and capture its output.
    ///
    /// Implementations should delegate to `run_with_timeout` using the
    /// instance's configured default timeout.
    async fn run(&self, program: &str, args: &[&str]) -> Result<Output>;
    /// Run a program with a custom timeout override.
    ///
    /// # Errors
    ///
    /// Returns an error if the process cannot be spawned or exceeds `timeout`.
    /// On timeout, the child process must be killed (not left orphaned).
    async fn run_with_timeout(
        &self,
        program: &str,
        args: &[&str],
        timeout: Duration,
    ) -> Result<Output>;
    /// Whether `program` can be found on `PATH`.
    fn command_exists(&self, program: &str) -> bool;
}

// ── Progress Reporting Port ───────────────────────────────────────────────────

/// Abstracts progress reporting so services can emit events without
/// depending on the Presentation layer. Sync trait — no async needed.
pub trait ProgressReporter {
    /// Emit an in-progress step message.
    fn step(&self, message: &str);
    /// Emit a success message.
    fn success(&self, message: &str);
    /// Emit a warning message.
    fn warn(&self, message: &str);
}

// ── Prompt Port ───────────────────────────────────────────────────────────────

/// Abstracts operator input so the collector can be driven by a script in tests.
pub trait Prompter {
    /// Ask for a line of text, offering `default`.
    fn input(&self, prompt: &str, default: &str) -> Result<String>;
    /// Ask for a secret without echo. Empty input is allowed.
    fn password(&self, prompt: &str) -> Result<String>;
    /// Ask a yes/no question.
    fn confirm(&self, prompt: &str, default: bool) -> Result<bool>;
}

// ── Config Port ───────────────────────────────────────────────────────────────

/// Abstracts persistence of the installer defaults file.
pub trait ConfigStore {
    /// Load the config, returning defaults when no file exists.
    fn load(&self) -> Result<InstallerConfig>;
    /// Persist the config.
    fn save(&self, config: &InstallerConfig) -> Result<()>;
    /// Location of the config file.
    fn path(&self) -> Result<PathBuf>;
}

// ── Host Ports ────────────────────────────────────────────────────────────────

/// Installs what the server needs on the host.
#[allow(async_fn_in_trait)]
pub trait Provisioner {
    /// Install `package` unless it is already installed.
    async fn ensure_installed(&self, package: &str) -> Result<()>;
    /// Install and start the container runtime unless it already answers.
    async fn ensure_runtime_active(&self) -> Result<()>;
}

/// Opens the server port on the host firewall.
#[allow(async_fn_in_trait)]
pub trait NetworkExposer {
    /// Allow `port` for each of `protocols`. Idempotent.
    async fn open_port(&self, port: u16, protocols: &[Protocol]) -> Result<FirewallOutcome>;
}

/// Starts and observes the server process.
#[allow(async_fn_in_trait)]
pub trait ServiceDriver {
    /// (Re)start the service so it reads the new configuration.
    async fn restart(&self) -> Result<()>;
    /// Whether the service is running.
    async fn is_active(&self) -> Result<bool>;
    /// Recent service output.
    async fn logs(&self) -> Result<String>;
    /// Command an operator can run to inspect the service.
    fn inspect_hint(&self) -> String;

    /// Poll `logs()` until `pattern` captures a secret, up to `attempts` times.
    ///
    /// Log read failures count as a miss; the wait never fails the run.
    async fn wait_for_secret(
        &self,
        pattern: &Regex,
        attempts: u32,
        interval: Duration,
    ) -> SecretOutcome {
        for attempt in 1..=attempts {
            match self.logs().await {
                Ok(logs) => {
                    if let Some(secret) = extract_secret(pattern, &logs) {
                        return SecretOutcome::Found(secret.to_string());
                    }
                }
                Err(e) => tracing::debug!(attempt, error = %e, "log read failed"),
            }
            if attempt < attempts {
                tokio::time::sleep(interval).await;
            }
        }
        SecretOutcome::TimedOut
    }
}

/// Sets the server's SuperUser password directly.
#[allow(async_fn_in_trait)]
pub trait SuperUserAdmin {
    async fn set_superuser_password(&self, password: &str) -> Result<()>;
}
