//! Log output for the `medihelp` binary and tests.
//!
//! Everything goes to stderr so listings on stdout stay parseable.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Warnings only, unless `RUST_LOG` asks for more (`RUST_LOG=medihelp_core=debug`
/// shows every file read and write).
pub fn init() {
    init_with_level("warn")
}

pub fn init_with_level(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact().with_writer(std::io::stderr))
        .init();
}

/// Debug-level output routed through the test harness; safe to call from every test.
pub fn init_test() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter(EnvFilter::new("debug"))
        .try_init();
}
