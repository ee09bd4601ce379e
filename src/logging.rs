//! Stdout tracing setup for binaries that embed this crate.
//!
//! The library itself never installs a subscriber — only emits
//! `tracing` events — so this is opt-in, called once by `main`.

use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Install a stdout `tracing` subscriber. `use_json` selects structured
/// JSON output (useful when logs are shipped to a collector) over the
/// human-readable default.
pub fn init_logging(use_json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    if use_json {
        registry.with(fmt::layer().json().with_target(true)).init();
    } else {
        registry.with(fmt::layer().with_target(false)).init();
    }
}
