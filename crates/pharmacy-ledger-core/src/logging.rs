//! Tracing/logging initialization.

use tracing_subscriber::EnvFilter;

/// Initialize tracing for the host process.
///
/// Filter comes from `RUST_LOG` (default `info`). Safe to call multiple
/// times; later calls are no-ops.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .json()
        .with_target(false)
        .try_init();
}
