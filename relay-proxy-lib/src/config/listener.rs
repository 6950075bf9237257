use serde::Deserialize;
use std::net::SocketAddr;

use super::matcher::MatcherConfig;
use super::service::ServiceConfig;
use super::tls::TlsConfig;

/// Whether, and how broadly, `Location` response headers get rewritten.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum RewriteLocation {
    #[default]
    Off,
    SameHostOnly,
    AnyListener,
}

/// A bound socket plus the services eligible for requests arriving on it.
#[derive(Debug, Deserialize, Clone)]
pub struct ListenerConfig {
    pub address: SocketAddr,
    #[serde(default)]
    pub tls: Option<TlsConfig>,
    #[serde(default)]
    pub default_host: Option<String>,
    #[serde(default)]
    pub service: Vec<ServiceConfig>,
    #[serde(default)]
    pub rewrite_location: RewriteLocation,
    #[serde(default)]
    pub rewrite_destination: bool,
    #[serde(default)]
    pub no_ssl_redirect: Option<String>,
    #[serde(default)]
    pub force_http10: Vec<MatcherConfig>,
    #[serde(default)]
    pub disabled: bool,
    /// Preserve the original Host header when forwarding to backends.
    #[serde(default)]
    pub preserve_host: bool,
}
