//! Command implementations

pub mod config;
pub mod docker;
pub mod native;
pub mod restore;
pub mod version;

use std::future::Future;

use anyhow::Result;

use crate::domain::SetupError;

/// Run a mutating pipeline until it finishes or the operator presses Ctrl-C.
///
/// On Ctrl-C the pipeline future is dropped, which drops any backup guard it
/// holds and puts the artifact back. The signal handler is installed here and
/// not earlier, so Ctrl-C at a prompt still ends the process outright.
///
/// # Errors
///
/// Returns the pipeline's error, or `SetupError::Interrupted`.
pub async fn interruptible<T>(pipeline: impl Future<Output = Result<T>>) -> Result<T> {
    tokio::select! {
        result = pipeline => result,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("interrupted by operator");
            Err(SetupError::Interrupted.into())
        }
    }
}
