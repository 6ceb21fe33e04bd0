//! Configuration engine for Mumble server deployments.
//!
//! Rewrites a compose file or a `mumble-server.ini` from a set of collected
//! fields. Only recognized directives are touched; every other line is
//! copied through byte for byte. File replacement is atomic and guarded by a
//! backup that rolls back unless committed.

pub mod artifact;
pub mod backup;
pub mod compose;
pub mod dialect;
pub mod error;
pub mod field;
pub mod ini;
pub mod rules;
mod transform;

pub use backup::{ArtifactBackup, BackupNaming};
pub use dialect::{Dialect, ValueKind};
pub use error::ArtifactError;
pub use field::{ConfigurationField, ConfigurationSet, DEFAULT_PORT, Validator, keys, parse_bool};
pub use rules::{Emission, LineOutcome, Matcher, Policy, Protocol, Rule, RuleTable};
pub use transform::LineEnding;
