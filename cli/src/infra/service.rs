//! Infrastructure implementations of the `ServiceDriver` and
//! `SuperUserAdmin` ports.
//!
//! `ComposeService` drives the container through `docker compose`;
//! `SystemdService` drives the packaged unit through `systemctl`.

use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::application::ports::{CommandRunner, ServiceDriver, SuperUserAdmin};
use crate::infra::command_runner::{INSTALL_TIMEOUT, TokioCommandRunner, ensure_success};

/// Server binary shipped by the `mumble-server` package.
pub const SERVER_BINARY: &str = "murmurd";

/// A service defined in a compose file.
pub struct ComposeService<R: CommandRunner> {
    runner: R,
    file: PathBuf,
    service: String,
}

impl<R: CommandRunner> ComposeService<R> {
    pub fn new(runner: R, file: &Path, service: &str) -> Self {
        Self {
            runner,
            file: file.to_path_buf(),
            service: service.to_string(),
        }
    }

    async fn compose(&self, args: &[&str]) -> Result<std::process::Output> {
        let file = self.file.to_string_lossy();
        let mut full = vec!["compose", "-f", &*file];
        full.extend_from_slice(args);
        self.runner.run_with_timeout("docker", &full, INSTALL_TIMEOUT).await
    }
}

impl ComposeService<TokioCommandRunner> {
    #[must_use]
    pub fn default_runner(file: &Path, service: &str) -> Self {
        Self::new(TokioCommandRunner::default(), file, service)
    }
}

impl<R: CommandRunner> ServiceDriver for ComposeService<R> {
    async fn restart(&self) -> Result<()> {
        let output = self.compose(&["up", "-d", "--force-recreate"]).await?;
        ensure_success(output, "docker compose up")?;
        Ok(())
    }

    async fn is_active(&self) -> Result<bool> {
        let output = self
            .compose(&["ps", "--status", "running", "-q", &self.service])
            .await?;
        let output = ensure_success(output, "docker compose ps")?;
        Ok(!String::from_utf8_lossy(&output.stdout).trim().is_empty())
    }

    async fn logs(&self) -> Result<String> {
        let output = self.compose(&["logs", "--no-color", &self.service]).await?;
        let output = ensure_success(output, "docker compose logs")?;
        // the image logs to both streams
        let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
        text.push_str(&String::from_utf8_lossy(&output.stderr));
        Ok(text)
    }

    fn inspect_hint(&self) -> String {
        format!(
            "docker compose -f {} logs {}",
            self.file.display(),
            self.service
        )
    }
}

/// A systemd unit running the packaged server.
pub struct SystemdService<R: CommandRunner> {
    runner: R,
    ini_file: PathBuf,
    unit: String,
}

impl<R: CommandRunner> SystemdService<R> {
    pub fn new(runner: R, ini_file: &Path, unit: &str) -> Self {
        Self {
            runner,
            ini_file: ini_file.to_path_buf(),
            unit: unit.to_string(),
        }
    }
}

impl SystemdService<TokioCommandRunner> {
    #[must_use]
    pub fn default_runner(ini_file: &Path, unit: &str) -> Self {
        Self::new(TokioCommandRunner::default(), ini_file, unit)
    }
}

impl<R: CommandRunner> ServiceDriver for SystemdService<R> {
    async fn restart(&self) -> Result<()> {
        let output = self.runner.run("systemctl", &["restart", &self.unit]).await?;
        ensure_success(output, &format!("systemctl restart {}", self.unit))?;
        Ok(())
    }

    async fn is_active(&self) -> Result<bool> {
        let output = self
            .runner
            .run("systemctl", &["is-active", "--quiet", &self.unit])
            .await?;
        Ok(output.status.success())
    }

    async fn logs(&self) -> Result<String> {
        let output = self
            .runner
            .run("journalctl", &["-u", &self.unit, "--no-pager"])
            .await?;
        let output = ensure_success(output, "journalctl")?;
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    fn inspect_hint(&self) -> String {
        format!("journalctl -u {} --no-pager", self.unit)
    }
}

impl<R: CommandRunner> SuperUserAdmin for SystemdService<R> {
    async fn set_superuser_password(&self, password: &str) -> Result<()> {
        let ini = self.ini_file.to_string_lossy();
        let output = self
            .runner
            .run(SERVER_BINARY, &["-ini", &*ini, "-supw", password])
            .await?;
        ensure_success(output, "setting the SuperUser password")?;
        Ok(())
    }
}
