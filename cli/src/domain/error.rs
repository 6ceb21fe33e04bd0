//! Typed domain error enums.
//!
//! This module has zero imports from `crate::infra`, `crate::commands`,
//! `crate::application`, `tokio`, `std::fs`, `std::process`, or `std::net`.
//! All error types implement `thiserror::Error` and convert to `anyhow::Error`
//! via the `?` operator.

use thiserror::Error;

// ── Config errors ─────────────────────────────────────────────────────────────

/// Errors related to installer config key/value validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Unknown setting: {key}\n\nValid settings: {valid}")]
    UnknownKey { key: String, valid: String },

    #[error("Invalid value for {key}: {value}\n\n{reason}")]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },
}

// ── Setup errors ──────────────────────────────────────────────────────────────

/// Errors raised while collecting input or driving the host toward a running
/// server.
#[derive(Debug, Error)]
pub enum SetupError {
    #[error("Invalid override '{0}': expected KEY=VALUE")]
    BadOverride(String),

    #[error("Unknown field '{key}'. Valid fields: {valid}")]
    UnknownField { key: String, valid: String },

    #[error("Invalid value for {key}: {reason}\n\nPass a valid value with --set {key}=<value>")]
    InvalidInput { key: String, reason: String },

    #[error("Required tool not found: {tool}. {hint}")]
    ToolMissing { tool: String, hint: String },

    #[error("{action} failed: {detail}")]
    ToolFailed { action: String, detail: String },

    #[error("{service} is not running after restart.\n\nInspect: {hint}")]
    ServiceNotActive { service: String, hint: String },

    #[error("Interrupted; any configuration change made so far was rolled back")]
    Interrupted,
}
