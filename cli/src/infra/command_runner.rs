//! Infrastructure implementation of the `CommandRunner` port.
//!
//! `TokioCommandRunner` is the production implementation that uses tokio
//! for async process execution with guaranteed timeout and kill on all platforms.

use std::process::{Output, Stdio};
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::io::AsyncReadExt;

use crate::application::ports::CommandRunner;
use crate::domain::SetupError;

/// Default timeout for short host commands (status checks, firewall, logs).
pub const DEFAULT_CMD_TIMEOUT: Duration = Duration::from_secs(60);

/// Timeout for package installs and the container runtime installer.
pub const INSTALL_TIMEOUT: Duration = Duration::from_secs(900);

/// Arguments whose following value is never logged.
const SECRET_FLAGS: &[&str] = &["-supw"];

/// Production `CommandRunner` — uses tokio for async process execution
/// with guaranteed timeout and kill on all platforms.
///
/// `tokio::time::timeout` around `.output().await` does not reliably kill the
/// child when the timeout fires. This implementation uses `tokio::select!`
/// with an explicit `child.kill()` so the process is terminated.
pub struct TokioCommandRunner {
    timeout: Duration,
}

impl TokioCommandRunner {
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl Default for TokioCommandRunner {
    fn default() -> Self {
        Self::new(DEFAULT_CMD_TIMEOUT)
    }
}

/// `args` with the value after any secret-bearing flag masked.
#[must_use]
pub fn redact<'a>(args: &[&'a str]) -> Vec<&'a str> {
    let mut out = Vec::with_capacity(args.len());
    let mut mask_next = false;
    for arg in args {
        out.push(if mask_next { "***" } else { *arg });
        mask_next = SECRET_FLAGS.contains(arg);
    }
    out
}

/// Turn a non-zero exit into `SetupError::ToolFailed` naming `action`.
///
/// # Errors
///
/// Returns an error if `output` did not exit successfully.
pub fn ensure_success(output: Output, action: &str) -> Result<Output> {
    if output.status.success() {
        return Ok(output);
    }
    let stderr = String::from_utf8_lossy(&output.stderr);
    let detail = match stderr.trim() {
        "" => format!("exit status {}", output.status.code().unwrap_or(-1)),
        text => text.lines().last().unwrap_or(text).to_string(),
    };
    Err(SetupError::ToolFailed {
        action: action.to_string(),
        detail,
    }
    .into())
}

impl CommandRunner for TokioCommandRunner {
    async fn run(&self, program: &str, args: &[&str]) -> Result<Output> {
        self.run_with_timeout(program, args, self.timeout).await
    }

    async fn run_with_timeout(
        &self,
        program: &str,
        args: &[&str],
        timeout: Duration,
    ) -> Result<Output> {
        tracing::debug!(program, args = ?redact(args), timeout_s = timeout.as_secs(), "exec");
        let mut child = tokio::process::Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("failed to spawn {program}"))?;

        let mut stdout_handle = child.stdout.take();
        let mut stderr_handle = child.stderr.take();

        tokio::select! {
            result = async {
                let (status, stdout, stderr) = tokio::join!(
                    child.wait(),
                    async {
                        let mut buf = Vec::new();
                        if let Some(ref mut h) = stdout_handle {
                            let _ = h.read_to_end(&mut buf).await;
                        }
                        buf
                    },
                    async {
                        let mut buf = Vec::new();
                        if let Some(ref mut h) = stderr_handle {
                            let _ = h.read_to_end(&mut buf).await;
                        }
                        buf
                    },
                );
                let status = status.with_context(|| format!("waiting for {program}"))?;
                tracing::trace!(program, code = ?status.code(), "exit");
                Ok(Output { status, stdout, stderr })
            } => result,
            () = tokio::time::sleep(timeout) => {
                let _ = child.kill().await;
                anyhow::bail!("{program} timed out after {}s", timeout.as_secs())
            }
        }
    }

    fn command_exists(&self, program: &str) -> bool {
        which::which(program).is_ok()
    }
}
