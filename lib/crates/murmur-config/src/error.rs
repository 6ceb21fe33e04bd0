//! Errors raised while reading, rewriting or replacing a configuration artifact.

use std::path::PathBuf;

use thiserror::Error;

/// Failure of a transformation or backup operation.
///
/// Every variant is fatal: the engine never reports partial success.
#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("configuration file not found: {}", .0.display())]
    Missing(PathBuf),

    #[error("cannot access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot create temporary file next to {}: {source}", path.display())]
    TempFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot replace {}: {source}", path.display())]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("no `{0}:` section to insert missing directives into")]
    MissingSection(&'static str),

    #[error("required field `{0}` has no value")]
    Incomplete(String),
}

impl ArtifactError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
