//! Logging infrastructure for Dosette.
//!
//! Centralized tracing setup shared by every binary that embeds the engine.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize logging at the default INFO level.
///
/// The engine logs which safety check fired and what it resolved at
/// debug/info level; RUST_LOG overrides the default filter.
pub fn init() {
    init_with_level("info")
}

/// Initialize logging with a specific default level
/// (debug, info, warn, error). RUST_LOG still takes precedence.
pub fn init_with_level(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    // Logs go to stderr so stdout stays clean for --json consumers
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact().with_writer(std::io::stderr))
        .init();
}
