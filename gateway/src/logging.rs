//! Log subscriber setup

use crate::config::RuntimeEnv;
use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "info,tower_http=info";

/// Install the global subscriber: JSON lines in production, text otherwise.
///
/// `RUST_LOG` overrides the default filter.
pub fn init(env: RuntimeEnv) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    match env {
        RuntimeEnv::Production => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_current_span(false)
            .init(),
        RuntimeEnv::Development => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_level(true)
            .init(),
    }
}
