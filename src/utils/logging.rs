//! Logging Bootstrap
//!
//! `tracing` events are forwarded to the `log` facade; `env_logger` prints
//! them. `RUST_LOG` overrides the default `info` filter.

use std::sync::Once;

static INIT: Once = Once::new();

/// Install the process-wide logger. Safe to call more than once.
pub fn init() {
    INIT.call_once(|| {
        let mut builder = env_logger::Builder::new();
        builder.filter_level(log::LevelFilter::Info);
        if let Ok(filters) = std::env::var("RUST_LOG") {
            builder.parse_filters(&filters);
        }
        // A logger may already be installed by an embedding test harness.
        let _ = builder.try_init();
    });
}
