use serde::Deserialize;

use super::control::ControlConfig;
use super::listener::ListenerConfig;
use super::maintenance::MaintenanceConfig;
use super::security::SecurityConfig;
use super::service::ServiceConfig;
use super::telemetry::{LoggingConfig, TelemetryConfig};
use super::timeout::TimeoutConfig;

/// Main configuration structure.
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Bound sockets and the services eligible on each.
    /// At least one listener is required.
    pub listener: Vec<ListenerConfig>,
    /// Services shared across every listener whose `global` flag is set.
    /// Listener-local services are declared inline under `listener.service`.
    #[serde(default)]
    pub service: Vec<ServiceConfig>,
    /// Operator control channel (Unix domain socket).
    #[serde(default)]
    pub control: ControlConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Timeout configuration.
    #[serde(default)]
    pub timeout: TimeoutConfig,
    /// Security configuration (IP filtering, rate limiting, security headers).
    #[serde(default)]
    pub security: SecurityConfig,
    /// Telemetry configuration (metrics, tracing).
    #[serde(default)]
    pub telemetry: TelemetryConfig,
    /// Background maintenance loop intervals (health, expiry, rescale).
    #[serde(default)]
    pub maintenance: MaintenanceConfig,
}
