use serde::Deserialize;

/// HTTP version preference for backend connections.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BackendHttpVersion {
    Http11,
    Http2,
    /// Preserve the client's HTTP version.
    Preserve,
}

/// Redirect mode for a back-end of kind `redirect`.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum RedirectMode {
    /// Always redirect to the literal target.
    Static,
    /// Append the request path to the target.
    AppendPath,
    /// Substitute capture groups from the matched URL pattern into the target.
    DynamicSubstitution,
}

/// A back-end's behavior: either a normal proxied upstream, or a redirect
/// returned directly to the client without contacting any upstream.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum BackendKind {
    Normal,
    Redirect {
        #[serde(default = "default_redirect_status")]
        status: u16,
        target: String,
        #[serde(default = "default_redirect_mode")]
        mode: RedirectMode,
    },
}

impl Default for BackendKind {
    fn default() -> Self {
        BackendKind::Normal
    }
}

fn default_redirect_status() -> u16 {
    302
}

fn default_redirect_mode() -> RedirectMode {
    RedirectMode::Static
}

/// One upstream endpoint, as written in configuration.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct BackendConfig {
    /// `host:port`.
    pub address: String,
    /// Separate address probed by the health loop. Defaults to `address`.
    #[serde(default)]
    pub ha_address: Option<String>,
    /// Routing weight. 0 means "defined but never selected".
    #[serde(default = "default_priority")]
    pub priority: i64,
    #[serde(default)]
    pub kind: BackendKind,
    /// HTTP version to use when connecting to this backend.
    #[serde(default)]
    pub http_version: Option<BackendHttpVersion>,
    /// Connect to this backend over TLS.
    #[serde(default)]
    pub tls: bool,
    /// Extra CA certificate (PEM) to trust for this backend, in addition to
    /// the platform's native trust store. Useful for private/self-signed CAs.
    #[serde(default)]
    pub tls_ca_cert_path: Option<String>,
    /// Stable identifier usable for explicit selection via the back-end cookie.
    #[serde(default)]
    pub bekey: Option<String>,
    #[serde(default = "default_connect_ms")]
    pub connect_timeout_ms: u64,
    #[serde(default = "default_io_ms")]
    pub read_timeout_ms: u64,
    #[serde(default = "default_io_ms")]
    pub write_timeout_ms: u64,
}

fn default_priority() -> i64 {
    1
}

fn default_connect_ms() -> u64 {
    5_000
}

fn default_io_ms() -> u64 {
    30_000
}
