use std::net::SocketAddr;
use std::sync::Arc;

use crate::config::{IpFilterConfig, RateLimitConfig, SecurityHeaders};
use crate::core::{Listener, RuntimeContext};
use crate::proxy::client_pool::ClientPool;
use crate::security::RateLimitManager;
use crate::telemetry::Metrics;

/// Security-related context for request handling.
#[derive(Clone)]
pub struct SecurityContext {
    pub headers: SecurityHeaders,
    pub ip_filter: IpFilterConfig,
    pub rate_limit_config: RateLimitConfig,
    pub rate_limit_manager: Option<Arc<RateLimitManager>>,
}

impl SecurityContext {
    pub fn new(
        headers: SecurityHeaders,
        ip_filter: IpFilterConfig,
        rate_limit_config: RateLimitConfig,
        rate_limit_manager: Option<Arc<RateLimitManager>>,
    ) -> Self {
        Self { headers, ip_filter, rate_limit_config, rate_limit_manager }
    }
}

/// Per-connection context shared by every request handled on it: the
/// runtime's listener/service/back-end graph, the owning listener, the
/// shared back-end client pool, and security policy.
pub struct RequestContext {
    pub runtime: Arc<RuntimeContext>,
    pub listener: Arc<Listener>,
    pub client_pool: Arc<ClientPool>,
    pub security: SecurityContext,
    pub metrics: Option<Arc<Metrics>>,
    pub peer: SocketAddr,
    pub is_https: bool,
}
