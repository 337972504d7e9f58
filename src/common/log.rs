//! Logging setup on top of `tracing`.
//!
//! The library only emits events; embedding hosts that already installed a
//! subscriber keep theirs.

use tracing_subscriber::EnvFilter;

/// Install a formatted subscriber filtered by `level` (an `EnvFilter` directive).
///
/// Returns `false` when a global subscriber was already set or the directive
/// did not parse.
pub fn init(level: &str) -> bool {
    let filter = match EnvFilter::try_new(level) {
        Ok(filter) => filter,
        Err(_) => return false,
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .is_ok()
}
