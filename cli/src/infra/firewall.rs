//! Infrastructure implementation of the `NetworkExposer` port.
//!
//! Prefers `ufw`, then `firewalld`. With neither installed the port is left
//! to the operator.

use anyhow::Result;
use murmur_config::Protocol;

use crate::application::ports::{CommandRunner, NetworkExposer};
use crate::domain::FirewallOutcome;
use crate::infra::command_runner::{TokioCommandRunner, ensure_success};

pub struct HostFirewall<R: CommandRunner> {
    runner: R,
}

impl<R: CommandRunner> HostFirewall<R> {
    pub fn new(runner: R) -> Self {
        Self { runner }
    }

    async fn ufw(&self, port: u16, protocols: &[Protocol]) -> Result<()> {
        for proto in protocols {
            let rule = format!("{port}/{proto}");
            let output = self.runner.run("ufw", &["allow", &rule]).await?;
            ensure_success(output, &format!("ufw allow {rule}"))?;
        }
        Ok(())
    }

    async fn firewalld(&self, port: u16, protocols: &[Protocol]) -> Result<()> {
        for proto in protocols {
            let arg = format!("--add-port={port}/{proto}");
            let output = self
                .runner
                .run("firewall-cmd", &["--permanent", &arg])
                .await?;
            ensure_success(output, &format!("firewall-cmd {arg}"))?;
        }
        let output = self.runner.run("firewall-cmd", &["--reload"]).await?;
        ensure_success(output, "firewall-cmd --reload")?;
        Ok(())
    }
}

impl HostFirewall<TokioCommandRunner> {
    #[must_use]
    pub fn default_runner() -> Self {
        Self::new(TokioCommandRunner::default())
    }
}

impl<R: CommandRunner> NetworkExposer for HostFirewall<R> {
    async fn open_port(&self, port: u16, protocols: &[Protocol]) -> Result<FirewallOutcome> {
        let tool = if self.runner.command_exists("ufw") {
            self.ufw(port, protocols).await?;
            "ufw"
        } else if self.runner.command_exists("firewall-cmd") {
            self.firewalld(port, protocols).await?;
            "firewalld"
        } else {
            tracing::debug!(port, "no firewall tool found");
            return Ok(FirewallOutcome::Skipped);
        };
        Ok(FirewallOutcome::Opened {
            tool: tool.to_string(),
            port,
            protocols: protocols.to_vec(),
        })
    }
}
