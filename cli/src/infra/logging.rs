//! Diagnostic logging to stderr.
//!
//! `RUST_LOG` wins when set; otherwise `-v` flags pick the level.

use tracing_subscriber::EnvFilter;

/// Install the global subscriber. Safe to call once per process.
pub fn init(verbosity: u8) {
    let fallback = match verbosity {
        0 => "warn",
        1 => "murmur_setup=debug,murmur_config=debug,warn",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
