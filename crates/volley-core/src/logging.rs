//! Tracing initialization for binaries and tests.

use tracing_subscriber::EnvFilter;

/// Initialize the global tracing subscriber with an env-filter.
///
/// `RUST_LOG` wins when set; otherwise `default_filter` applies
/// (e.g. `"volley=info"`). Safe to call more than once — subsequent
/// calls are no-ops, which keeps test setups simple.
pub fn init_tracing(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init();
}
