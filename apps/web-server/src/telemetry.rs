//! Log subscriber setup.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_FILTER: &str = "info,web_server=debug,blog_infra=debug";

/// How log lines are written.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// One JSON object per line instead of the human-readable format.
    pub json_logs: bool,
    pub service_name: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            json_logs: false,
            service_name: "blogicum".to_string(),
        }
    }
}

impl TelemetryConfig {
    /// `LOG_FORMAT=json` and `SERVICE_NAME`.
    pub fn from_env() -> Self {
        Self {
            json_logs: std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json")),
            service_name: std::env::var("SERVICE_NAME")
                .unwrap_or_else(|_| "blogicum".to_string()),
        }
    }
}

/// Install the global subscriber. `RUST_LOG` overrides the default filter.
pub fn init_telemetry(config: &TelemetryConfig) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let registry = tracing_subscriber::registry().with(env_filter);
    if config.json_logs {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_current_span(true))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().compact().with_target(false))
            .init();
    }

    tracing::info!(service = %config.service_name, "Logging ready");
}
