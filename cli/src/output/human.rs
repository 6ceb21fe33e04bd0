//! Human-readable terminal renderer.

use std::path::Path;

use owo_colors::OwoColorize as _;

use crate::domain::config::InstallerConfig;
use crate::domain::{FirewallOutcome, InstallSummary, SuperUserStatus};
use crate::infra::config::CONFIG_ENV;
use crate::output::OutputContext;

/// Renders domain types as human-readable terminal output using `OutputContext`.
pub struct HumanRenderer<'a> {
    ctx: &'a OutputContext,
}

impl<'a> HumanRenderer<'a> {
    /// Create a new `HumanRenderer` wrapping the given output context.
    #[must_use]
    pub fn new(ctx: &'a OutputContext) -> Self {
        Self { ctx }
    }

    /// Render the CLI version information.
    pub fn render_version(&self, version: &str) {
        println!("murmur-setup {version}");
    }

    /// Render the completion report of an install.
    ///
    /// The SuperUser password is shown even in quiet mode; it is the one
    /// thing the operator cannot recover from the artifact.
    pub fn render_summary(&self, summary: &InstallSummary) {
        let ctx = self.ctx;
        if !ctx.quiet {
            println!();
            ctx.header("Mumble server is ready");
            println!();
            ctx.kv("Mode:         ", &summary.mode.to_string());
            ctx.kv("Config:       ", &summary.artifact.display().to_string());
            if let Some(backup) = &summary.backup {
                ctx.kv("Backup:       ", &backup.display().to_string());
            }
            ctx.kv("Server name:  ", &summary.server_name);
            ctx.kv("Address:      ", &format!("{}:{}", summary.address, summary.port));
            ctx.kv("Max users:    ", &summary.max_users.to_string());
            ctx.kv("Password:     ", yes_no(summary.password_protected));
            let listing = match (&summary.register_hostname, summary.public) {
                (Some(host), true) => format!("public ({host})"),
                (None, true) => "public".to_string(),
                _ => "private".to_string(),
            };
            ctx.kv("Listing:      ", &listing);
            ctx.kv("Firewall:     ", &firewall_line(&summary.firewall, summary.port));
            println!();
        }

        match &summary.superuser {
            SuperUserStatus::Supplied => ctx.success("SuperUser password set from your answer"),
            SuperUserStatus::Extracted { password } => {
                println!(
                    "  {} SuperUser password: {}",
                    "ℹ".style(ctx.styles.info),
                    password.style(ctx.styles.secret)
                );
                ctx.info("Store it now; it is not shown again.");
            }
            SuperUserStatus::Unconfirmed { fallback } => {
                ctx.warn("The generated SuperUser password did not appear in the logs yet.");
                ctx.info(&format!("Set one by hand: {fallback}"));
            }
        }
    }

    /// Render the would-be artifact of a dry run.
    pub fn render_preview(&self, path: &Path, content: &str) {
        if !self.ctx.quiet {
            self.ctx
                .header(&format!("Dry run: {} would contain", path.display()));
            println!();
        }
        print!("{content}");
        if !content.ends_with('\n') {
            println!();
        }
    }

    /// Render a manual restore.
    pub fn render_restored(&self, file: &Path, backup: &Path) {
        self.ctx.success(&format!(
            "Restored {} from {}",
            file.display(),
            backup.display()
        ));
        self.ctx
            .info("Restart the server for the restored settings to take effect.");
    }

    /// Render the installer defaults.
    pub fn render_config(&self, config: &InstallerConfig, path: &Path) {
        println!();
        println!(
            "  {}",
            format!("Configuration ({})", path.display()).style(self.ctx.styles.header)
        );
        println!();
        for key in crate::domain::config::VALID_CONFIG_KEYS {
            let value = config.get(key).unwrap_or_default();
            let shown = if value.is_empty() { "(empty)" } else { value.as_str() };
            println!("  {:<24} {shown}", format!("{key}:"));
        }
        println!();
        println!("  {}", "Environment:".style(self.ctx.styles.bold));
        for var in [CONFIG_ENV, "MURMUR_SETUP_YES", "NO_COLOR"] {
            println!(
                "    {:<22} {}",
                format!("{var}:"),
                std::env::var(var).unwrap_or_else(|_| "(not set)".to_string())
            );
        }
        println!();
    }
}

fn yes_no(flag: bool) -> &'static str {
    if flag { "yes" } else { "no" }
}

fn firewall_line(outcome: &FirewallOutcome, port: u16) -> String {
    match outcome {
        FirewallOutcome::Opened { tool, protocols, .. } => {
            let list: Vec<String> = protocols.iter().map(|p| format!("{port}/{p}")).collect();
            format!("{} via {tool}", list.join(", "))
        }
        FirewallOutcome::Skipped => format!("not managed; open {port}/tcp and {port}/udp yourself"),
    }
}
