//! Infrastructure implementation of the `Provisioner` port.
//!
//! `HostProvisioner<R>` routes every apt, dpkg, docker and systemctl call
//! through a `CommandRunner`, so tests can inject a recording mock.

use anyhow::Result;

use crate::application::ports::{CommandRunner, Provisioner};
use crate::domain::SetupError;
use crate::infra::command_runner::{INSTALL_TIMEOUT, TokioCommandRunner, ensure_success};

/// Upstream convenience installer for Docker Engine.
pub const DOCKER_INSTALL_SCRIPT: &str = "curl -fsSL https://get.docker.com | sh";

/// Installs packages with apt and brings up the Docker daemon.
pub struct HostProvisioner<R: CommandRunner> {
    runner: R,
}

impl<R: CommandRunner> HostProvisioner<R> {
    pub fn new(runner: R) -> Self {
        Self { runner }
    }

    fn require(&self, tool: &str, hint: &str) -> Result<()> {
        if self.runner.command_exists(tool) {
            Ok(())
        } else {
            Err(SetupError::ToolMissing {
                tool: tool.to_string(),
                hint: hint.to_string(),
            }
            .into())
        }
    }

    async fn docker_answers(&self) -> bool {
        self.runner
            .run("docker", &["info"])
            .await
            .is_ok_and(|o| o.status.success())
    }

    async fn install_docker(&self) -> Result<()> {
        self.require("curl", "Install curl, or install Docker Engine manually.")?;
        let output = self
            .runner
            .run_with_timeout("sh", &["-c", DOCKER_INSTALL_SCRIPT], INSTALL_TIMEOUT)
            .await?;
        ensure_success(output, "Docker installation")?;
        Ok(())
    }
}

impl HostProvisioner<TokioCommandRunner> {
    /// Provisioner backed by real host processes.
    #[must_use]
    pub fn default_runner() -> Self {
        Self::new(TokioCommandRunner::default())
    }
}

impl<R: CommandRunner> Provisioner for HostProvisioner<R> {
    async fn ensure_installed(&self, package: &str) -> Result<()> {
        self.require("apt-get", "Only Debian and Ubuntu hosts are supported.")?;

        let installed = self
            .runner
            .run("dpkg", &["-s", package])
            .await
            .is_ok_and(|o| o.status.success());
        if installed {
            tracing::debug!(package, "already installed");
            return Ok(());
        }

        let output = self
            .runner
            .run_with_timeout("apt-get", &["update"], INSTALL_TIMEOUT)
            .await?;
        ensure_success(output, "apt-get update")?;

        let output = self
            .runner
            .run_with_timeout(
                "env",
                &[
                    "DEBIAN_FRONTEND=noninteractive",
                    "apt-get",
                    "install",
                    "-y",
                    package,
                ],
                INSTALL_TIMEOUT,
            )
            .await?;
        ensure_success(output, &format!("apt-get install {package}"))?;
        Ok(())
    }

    async fn ensure_runtime_active(&self) -> Result<()> {
        if !self.runner.command_exists("docker") {
            self.install_docker().await?;
        }
        if !self.docker_answers().await {
            let output = self
                .runner
                .run("systemctl", &["enable", "--now", "docker"])
                .await?;
            ensure_success(output, "starting the Docker daemon")?;
        }

        let compose = self.runner.run("docker", &["compose", "version"]).await?;
        if !compose.status.success() {
            return Err(SetupError::ToolMissing {
                tool: "docker compose".to_string(),
                hint: "Install the docker-compose-plugin package.".to_string(),
            }
            .into());
        }
        Ok(())
    }
}
