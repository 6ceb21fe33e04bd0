//! JSON output helpers.
//!
//! Every `--json` code path prints exactly one pretty-printed object on
//! stdout: a result document on success, an error object on failure.

use anyhow::{Context, Result};
use serde::Serialize;

use murmur_config::ArtifactError;

use crate::domain::config::InstallerConfig;
use crate::domain::{ConfigError, InstallSummary, SetupError};

/// Format a JSON error object.
///
/// Output (pretty-printed):
/// ```json
/// {
///   "error": true,
///   "message": "...",
///   "code": "..."
/// }
/// ```
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn format_error(message: &str, code: &str) -> Result<String> {
    let obj = serde_json::json!({
        "error": true,
        "message": message,
        "code": code,
    });
    serde_json::to_string_pretty(&obj).context("JSON serialization failed")
}

/// Stable machine-readable code for an error chain.
#[must_use]
pub fn error_code(err: &anyhow::Error) -> &'static str {
    for cause in err.chain() {
        if let Some(e) = cause.downcast_ref::<SetupError>() {
            return match e {
                SetupError::BadOverride(_) | SetupError::UnknownField { .. } => "BAD_OVERRIDE",
                SetupError::InvalidInput { .. } => "INVALID_INPUT",
                SetupError::ToolMissing { .. } => "TOOL_MISSING",
                SetupError::ToolFailed { .. } => "TOOL_FAILED",
                SetupError::ServiceNotActive { .. } => "SERVICE_NOT_ACTIVE",
                SetupError::Interrupted => "INTERRUPTED",
            };
        }
        if let Some(e) = cause.downcast_ref::<ArtifactError>() {
            return match e {
                ArtifactError::Missing(_) => "ARTIFACT_MISSING",
                ArtifactError::Incomplete(_) => "INCOMPLETE",
                _ => "ARTIFACT_IO",
            };
        }
        if cause.downcast_ref::<ConfigError>().is_some() {
            return "INVALID_CONFIG";
        }
    }
    "ERROR"
}

#[derive(Serialize)]
struct InstallDocument<'a> {
    #[serde(flatten)]
    summary: &'a InstallSummary,
    completed_at: String,
}

/// Format a completed install, stamped with the current UTC time.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn format_summary(summary: &InstallSummary) -> Result<String> {
    let doc = InstallDocument {
        summary,
        completed_at: chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
    };
    serde_json::to_string_pretty(&doc).context("JSON serialization failed")
}

/// Format the installer config together with its location.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn format_config(config: &InstallerConfig, path: &std::path::Path) -> Result<String> {
    let obj = serde_json::json!({
        "path": path,
        "config": config,
    });
    serde_json::to_string_pretty(&obj).context("JSON serialization failed")
}

/// Renders domain types as JSON on stdout.
pub struct JsonRenderer;

impl JsonRenderer {
    /// Render a completed install.
    ///
    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn render_summary(&self, summary: &InstallSummary) -> Result<()> {
        println!("{}", format_summary(summary)?);
        Ok(())
    }

    /// Render the installer config.
    ///
    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn render_config(&self, config: &InstallerConfig, path: &std::path::Path) -> Result<()> {
        println!("{}", format_config(config, path)?);
        Ok(())
    }

    /// Render the would-be artifact of a dry run.
    ///
    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn render_preview(&self, path: &std::path::Path, content: &str) -> Result<()> {
        self.render_object(&serde_json::json!({ "path": path, "dry_run": true, "content": content }))
    }

    /// Render an ad-hoc result object.
    ///
    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn render_object(&self, obj: &serde_json::Value) -> Result<()> {
        println!(
            "{}",
            serde_json::to_string_pretty(obj).context("JSON serialization failed")?
        );
        Ok(())
    }

    pub fn render_version(&self, version: &str) {
        println!(r#"{{"version":"{version}"}}"#);
    }
}
