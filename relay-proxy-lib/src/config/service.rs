use serde::Deserialize;

use super::backend::BackendConfig;
use super::headers::HeaderManipulation;
use super::matcher::MatcherConfig;
use super::security::RouteRateLimitConfig;

/// How a service extracts a session-affinity key from a request/response.
#[derive(Debug, Deserialize, Clone)]
#[serde(tag = "policy", rename_all = "kebab-case")]
pub enum SessionPolicyConfig {
    None,
    ClientIp,
    Cookie { name: String },
    UrlParam { name: String },
    UrlPathParam { name: String },
    HttpBasic,
    Header { name: String },
}

impl Default for SessionPolicyConfig {
    fn default() -> Self {
        SessionPolicyConfig::None
    }
}

/// A routing rule: a matcher pipeline plus a session policy and a back-end list.
#[derive(Debug, Deserialize, Clone)]
pub struct ServiceConfig {
    pub name: String,
    #[serde(default)]
    pub url_match: Vec<MatcherConfig>,
    #[serde(default)]
    pub headers_require: Vec<MatcherConfig>,
    #[serde(default)]
    pub headers_deny: Vec<MatcherConfig>,
    #[serde(default)]
    pub session: SessionPolicyConfig,
    /// Regex that locates the start of the session key within the source
    /// (request line, cookie header, etc). Required unless `session` is `none`.
    #[serde(default)]
    pub session_start: Option<String>,
    /// Regex (applied after `session_start` matches) whose first capture
    /// group is the session key itself.
    #[serde(default)]
    pub session_pattern: Option<String>,
    /// Response header regex that ends a session's affinity early.
    #[serde(default)]
    pub end_of_session: Option<MatcherConfig>,
    /// Session TTL in seconds. A negative value selects consistent-hash
    /// routing instead of a timed session table.
    #[serde(default = "default_session_ttl_secs")]
    pub session_ttl_secs: i64,
    #[serde(default = "default_death_ttl_secs")]
    pub death_ttl_secs: u64,
    #[serde(default)]
    pub lb_info_header: Option<MatcherConfig>,
    /// Cookie name carrying an explicit back-end selection (`bekey`).
    #[serde(default)]
    pub becookie: Option<String>,
    #[serde(default)]
    pub dynamic_rescale: bool,
    pub backend: Vec<BackendConfig>,
    #[serde(default)]
    pub emergency_backend: Option<BackendConfig>,
    /// Service is shared across all listeners rather than scoped to one.
    #[serde(default)]
    pub global: bool,
    #[serde(default)]
    pub disabled: bool,
    #[serde(default)]
    pub rate_limit: Option<RouteRateLimitConfig>,
    #[serde(default)]
    pub headers: Option<HeaderManipulation>,
}

fn default_session_ttl_secs() -> i64 {
    300
}

fn default_death_ttl_secs() -> u64 {
    30
}
