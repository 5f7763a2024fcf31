//! Tracing subscriber setup
//!
//! Hosts call `init_tracing` once at startup. The engine itself only emits
//! through the `tracing` macros and never installs a subscriber.

use tracing_subscriber::{fmt, EnvFilter};

use crate::config::ObservabilityConfig;

/// Install the global tracing subscriber according to the observability
/// config. `RUST_LOG` overrides the configured level. Safe to call once;
/// subsequent calls are ignored.
pub fn init_tracing(config: &ObservabilityConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.clone()));

    if config.json_logging {
        let _ = fmt()
            .json()
            .with_env_filter(filter)
            .with_current_span(true)
            .try_init();
    } else {
        let _ = fmt().with_env_filter(filter).try_init();
    }
}
