//! Tracing initialization for the operator directory daemon.
//!
//! Logs go to stderr so that command output on stdout stays machine
//! readable. `RUST_LOG` takes precedence over the configured level.

use tracing_subscriber::EnvFilter;

/// Install the console subscriber. Call once, before any events are emitted.
pub fn init(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
