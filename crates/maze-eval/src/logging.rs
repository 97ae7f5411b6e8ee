//! Diagnostic tracing setup for the `maze-eval` binary.
//!
//! Library code only emits `tracing` events; this module installs the
//! subscriber. Reports and the summary line are product output and do not
//! go through here.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install a stderr subscriber filtered by `RUST_LOG` (default `warn`).
///
/// ```bash
/// RUST_LOG=maze_eval=debug maze-eval layout.txt
/// ```
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .init();
}
