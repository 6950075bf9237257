mod backend;
mod control;
mod headers;
mod listener;
mod loader;
mod maintenance;
mod matcher;
mod root;
mod security;
mod service;
mod telemetry;
mod timeout;
mod tls;

pub use backend::{BackendConfig, BackendHttpVersion, BackendKind, RedirectMode};
pub use control::ControlConfig;
pub use headers::{CustomHeader, HeaderManipulation, HeaderManipulationGroup};
pub use listener::{ListenerConfig, RewriteLocation};
pub use loader::load_from_path;
pub use maintenance::MaintenanceConfig;
pub use matcher::MatcherConfig;
pub use root::Config;
pub use security::{
    CspConfig, HstsConfig, IpFilterConfig, IpFilterMode, LimitBy, RateLimitConfig,
    RouteRateLimitConfig, SecurityConfig, SecurityHeaders,
};
pub use service::{ServiceConfig, SessionPolicyConfig};
pub use telemetry::{LoggingConfig, TelemetryConfig};
pub use timeout::{KeepAliveConfig, TimeoutConfig};
pub use tls::{
    ClientAuth, SessionResumptionConfig, SniCertConfig, TlsConfig, TlsOptions, TlsVersion,
};
