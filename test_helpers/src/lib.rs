//! Helpers shared by tests across the workspace.
#![deny(rust_2018_idioms)]

use std::sync::Once;

static LOG_SETUP: Once = Once::new();

/// Enables tracing output for a test when `RUST_LOG` is set in the
/// environment. Safe to call from every test; only the first call installs
/// the subscriber.
pub fn maybe_start_logging() {
    if std::env::var("RUST_LOG").is_ok() {
        start_logging()
    }
}

/// Enables tracing output for a test unconditionally.
pub fn start_logging() {
    LOG_SETUP.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init()
            .ok();
    })
}
