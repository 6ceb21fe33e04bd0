//! Installer defaults and their validators.
//!
//! Pure functions only — no I/O, no async, no filesystem access.

use std::path::PathBuf;

use anyhow::Result;
use murmur_config::{DEFAULT_PORT, Validator, compose, ini};
use serde::{Deserialize, Serialize};

use crate::domain::error::ConfigError;

// ── Constants ────────────────────────────────────────────────────────────────

pub const VALID_CONFIG_KEYS: &[&str] = &[
    "defaults.server_name",
    "defaults.port",
    "defaults.max_users",
    "defaults.welcome_text",
    "docker.compose_file",
    "docker.service",
    "native.ini_file",
    "native.package",
    "native.service",
];

/// Package and unit name on Debian and Ubuntu.
pub const NATIVE_PACKAGE: &str = "mumble-server";

// ── Config schema ────────────────────────────────────────────────────────────

/// Top-level configuration stored in `~/.murmur-setup/config.yaml`.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct InstallerConfig {
    /// Answers offered when the operator just presses enter.
    pub defaults: Defaults,
    /// Container deployment settings.
    pub docker: DockerSettings,
    /// Package deployment settings.
    pub native: NativeSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Defaults {
    pub server_name: String,
    pub port: u16,
    pub max_users: u32,
    /// Empty means "derive from the server name".
    pub welcome_text: String,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            server_name: "Mumble Server".to_string(),
            port: DEFAULT_PORT,
            max_users: 100,
            welcome_text: String::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DockerSettings {
    pub compose_file: PathBuf,
    pub service: String,
}

impl Default for DockerSettings {
    fn default() -> Self {
        Self {
            compose_file: PathBuf::from("docker-compose.yml"),
            service: compose::SERVICE.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct NativeSettings {
    pub ini_file: PathBuf,
    pub package: String,
    pub service: String,
}

impl Default for NativeSettings {
    fn default() -> Self {
        Self {
            ini_file: PathBuf::from(ini::DEFAULT_PATH),
            package: NATIVE_PACKAGE.to_string(),
            service: NATIVE_PACKAGE.to_string(),
        }
    }
}

impl InstallerConfig {
    /// Current value of a whitelisted key, rendered as a string.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<String> {
        Some(match key {
            "defaults.server_name" => self.defaults.server_name.clone(),
            "defaults.port" => self.defaults.port.to_string(),
            "defaults.max_users" => self.defaults.max_users.to_string(),
            "defaults.welcome_text" => self.defaults.welcome_text.clone(),
            "docker.compose_file" => self.docker.compose_file.display().to_string(),
            "docker.service" => self.docker.service.clone(),
            "native.ini_file" => self.native.ini_file.display().to_string(),
            "native.package" => self.native.package.clone(),
            "native.service" => self.native.service.clone(),
            _ => return None,
        })
    }

    /// Set a whitelisted key after validating the value.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown or the value is invalid for it.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        validate_config_key(key)?;
        validate_config_value(key, value)?;
        let value = value.trim();
        match key {
            "defaults.server_name" => self.defaults.server_name = value.to_string(),
            "defaults.port" => self.defaults.port = value.parse()?,
            "defaults.max_users" => self.defaults.max_users = value.parse()?,
            "defaults.welcome_text" => self.defaults.welcome_text = value.to_string(),
            "docker.compose_file" => self.docker.compose_file = PathBuf::from(value),
            "docker.service" => self.docker.service = value.to_string(),
            "native.ini_file" => self.native.ini_file = PathBuf::from(value),
            "native.package" => self.native.package = value.to_string(),
            "native.service" => self.native.service = value.to_string(),
            _ => anyhow::bail!("Unknown setting: {key}"),
        }
        Ok(())
    }
}

// ── Validators ───────────────────────────────────────────────────────────────

/// Validates a configuration key against the whitelist.
///
/// # Errors
///
/// Returns an error if the key is not in the allowed list.
pub fn validate_config_key(key: &str) -> Result<()> {
    if !VALID_CONFIG_KEYS.contains(&key) {
        return Err(ConfigError::UnknownKey {
            key: key.to_string(),
            valid: VALID_CONFIG_KEYS.join(", "),
        }
        .into());
    }
    Ok(())
}

/// Validates a configuration value for the given key.
///
/// # Errors
///
/// Returns an error if the value is not valid for the key.
pub fn validate_config_value(key: &str, value: &str) -> Result<()> {
    let validator = match key {
        "defaults.port" => Validator::Port,
        "defaults.max_users" => Validator::PositiveInteger,
        // empty welcome text means "derive it"
        "defaults.welcome_text" => return Ok(()),
        _ => Validator::NonEmpty,
    };
    validator.check(value).map_err(|reason| {
        ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
            reason,
        }
        .into()
    })
}

// ── Unit tests ───────────────────────────────────────────────────────────────
