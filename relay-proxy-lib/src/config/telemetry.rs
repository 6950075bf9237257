use serde::Deserialize;

/// Telemetry configuration.
/// Controls observability features: Prometheus metrics and health-check endpoints.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct TelemetryConfig {
    /// Metrics server port (optional)
    /// If provided, starts a separate HTTP server on this port serving
    /// `/metrics`, `/health`, `/ready`, and `/live`.
    /// Default: None (metrics disabled)
    #[serde(default)]
    pub metrics_port: Option<u16>,
}

/// Logging configuration
/// Controls application-level structured logging (stdout/stderr)
#[derive(Debug, Deserialize, Clone, Default)]
pub struct LoggingConfig {
    /// Log level: "trace", "debug", "info", "warn", "error"
    /// Default: "info"
    /// Can be overridden at runtime via RUST_LOG environment variable
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Show module path (target) in log messages
    /// Default: false
    #[serde(default = "default_false")]
    pub show_target: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_false() -> bool {
    false
}
