//! Outcome types for a completed run and the SuperUser secret scrape.
//!
//! Pure functions only — no I/O, no async, no filesystem access.

use std::path::PathBuf;
use std::sync::LazyLock;

use murmur_config::{ConfigurationSet, Protocol, keys};
use regex::Regex;
use serde::Serialize;

use crate::domain::fields::Mode;

/// Line the server logs when it generates the SuperUser password.
pub static SUPERUSER_PASSWORD_RE: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new(r"Password for 'SuperUser' set to '(?P<password>[^']+)'").expect("valid regex")
});

/// The most recent SuperUser password announced in `logs`.
#[must_use]
pub fn extract_secret<'a>(pattern: &Regex, logs: &'a str) -> Option<&'a str> {
    pattern
        .captures_iter(logs)
        .last()
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
}

/// Result of opening a port on the host firewall.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FirewallOutcome {
    Opened { tool: String, port: u16, protocols: Vec<Protocol> },
    /// No supported firewall tool on the host.
    Skipped,
}

/// Result of polling the service logs for a generated secret.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SecretOutcome {
    Found(String),
    TimedOut,
}

/// What the operator learns about the SuperUser password.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SuperUserStatus {
    /// Set from the operator's answer.
    Supplied,
    /// Scraped from the service logs.
    Extracted { password: String },
    /// Not seen in the logs; `fallback` shows how to set one by hand.
    Unconfirmed { fallback: String },
}

/// Command that sets the SuperUser password by hand.
#[must_use]
pub fn superuser_fallback(mode: Mode, artifact: &std::path::Path, service: &str) -> String {
    match mode {
        Mode::Docker => format!(
            "docker compose -f {} exec {service} mumble-server -ini /data/mumble_server_config.ini -supw <password>",
            artifact.display()
        ),
        Mode::Native => format!(
            "sudo murmurd -ini {} -supw <password> && sudo systemctl restart {service}",
            artifact.display()
        ),
    }
}

/// Everything the completion report shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstallSummary {
    pub mode: Mode,
    pub artifact: PathBuf,
    pub backup: Option<PathBuf>,
    /// Whether the artifact content changed.
    pub changed: bool,
    pub address: String,
    pub port: u16,
    pub server_name: String,
    pub max_users: u32,
    pub password_protected: bool,
    pub public: bool,
    pub register_hostname: Option<String>,
    pub firewall: FirewallOutcome,
    pub superuser: SuperUserStatus,
}

/// Bind address the installer always configures.
pub const BIND_ALL: &str = "0.0.0.0";

impl InstallSummary {
    /// Build the summary from the collected fields.
    #[must_use]
    pub fn from_set(
        mode: Mode,
        artifact: PathBuf,
        set: &ConfigurationSet,
        firewall: FirewallOutcome,
        superuser: SuperUserStatus,
    ) -> Self {
        let public = set.is_enabled(keys::PUBLIC);
        Self {
            mode,
            artifact,
            backup: None,
            changed: false,
            address: BIND_ALL.to_string(),
            port: set.value(keys::PORT).trim().parse().unwrap_or(murmur_config::DEFAULT_PORT),
            server_name: set.value(keys::SERVER_NAME).to_string(),
            max_users: set.value(keys::MAX_USERS).trim().parse().unwrap_or_default(),
            password_protected: !set.value(keys::SERVER_PASSWORD).trim().is_empty(),
            public,
            register_hostname: public
                .then(|| set.value(keys::REGISTER_HOSTNAME).to_string())
                .filter(|h| !h.is_empty()),
            firewall,
            superuser,
        }
    }
}
