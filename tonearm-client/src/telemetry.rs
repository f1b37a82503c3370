//! Tracing subscriber setup for the tonearm binary.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use tonearm_core::{CatalogResult, ConfigError};

const DEFAULT_FILTER: &str = "tonearm=info,warn";

/// Logging configuration from environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelemetryConfig {
    /// `EnvFilter` directives. `RUST_LOG` wins over `TONEARM_LOG`.
    pub filter: String,
    /// Emit JSON lines instead of human-readable output.
    pub json: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            filter: DEFAULT_FILTER.to_string(),
            json: false,
        }
    }
}

impl TelemetryConfig {
    pub fn from_env() -> Self {
        let filter = std::env::var("RUST_LOG")
            .or_else(|_| std::env::var("TONEARM_LOG"))
            .ok()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_FILTER.to_string());
        let json = std::env::var("TONEARM_LOG_FORMAT")
            .map(|s| s.eq_ignore_ascii_case("json"))
            .unwrap_or(false);
        Self { filter, json }
    }

    fn env_filter(&self) -> Result<EnvFilter, ConfigError> {
        EnvFilter::try_new(&self.filter).map_err(|e| ConfigError::InvalidValue {
            field: "log filter".to_string(),
            value: self.filter.clone(),
            reason: e.to_string(),
        })
    }
}

/// Install the global subscriber. Logs go to stderr so stdout stays clean
/// for command output.
pub fn init_tracing(config: &TelemetryConfig) -> CatalogResult<()> {
    let env_filter = config.env_filter()?;

    let json_layer = config
        .json
        .then(|| fmt::layer().json().with_writer(std::io::stderr));
    let text_layer = (!config.json).then(|| fmt::layer().with_writer(std::io::stderr));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(text_layer)
        .try_init()
        .map_err(|e| ConfigError::InvalidValue {
            field: "tracing subscriber".to_string(),
            value: "global".to_string(),
            reason: e.to_string(),
        })?;

    tracing::debug!(filter = %config.filter, json = config.json, "Tracing initialized");
    Ok(())
}
