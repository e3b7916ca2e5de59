//! # Structured Logging
//!
//! Environment-aware tracing setup for embedders that do not install their own
//! subscriber. Production gets JSON output for log shipping, everything else a
//! human-readable console format. `RUST_LOG` overrides the per-environment
//! default filter. Initialization is idempotent and yields to a subscriber the
//! embedding process installed first.

use crate::config::DepotConfig;
use std::sync::OnceLock;
use tracing_subscriber::EnvFilter;

static LOGGER_INITIALIZED: OnceLock<()> = OnceLock::new();

/// Initialize structured logging once per process.
pub fn init_structured_logging() {
    LOGGER_INITIALIZED.get_or_init(|| {
        let environment = DepotConfig::detect_environment();
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(default_log_level(&environment)));

        let builder = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true);

        let already_set = if environment == "production" {
            builder.json().try_init().is_err()
        } else {
            builder.try_init().is_err()
        };
        if already_set {
            tracing::debug!("Global tracing subscriber already initialized");
        } else {
            tracing::info!(environment = %environment, "Structured logging initialized");
        }
    });
}

fn default_log_level(environment: &str) -> String {
    match environment {
        "production" => "info".to_string(),
        _ => "debug".to_string(),
    }
}
