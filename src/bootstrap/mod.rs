//! Startup helpers.

use env_logger::{Builder, Env};

/// Initialize logging for host-less runs. Respects `RUST_LOG`, defaults
/// to `info`. Safe to call more than once.
pub fn initialize_logger() {
    let _ = Builder::from_env(Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .try_init();
}
