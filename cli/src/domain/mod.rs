//! Domain layer — pure types, validation, and the field catalog.
//!
//! This module has zero imports from `crate::infra`, `crate::commands`,
//! `crate::application`, `tokio`, `std::fs`, `std::process`, or `std::net`.
//! All functions are synchronous and take data in, returning data out.

pub mod config;
pub mod error;
pub mod fields;
pub mod summary;

pub use config::{InstallerConfig, validate_config_key, validate_config_value};
pub use error::{ConfigError, SetupError};
pub use fields::{FieldKind, FieldSpec, Mode};
pub use summary::{FirewallOutcome, InstallSummary, SecretOutcome, SuperUserStatus};
