use thiserror::Error;

/// Errors that can occur in the proxy core and its ambient stack.
#[derive(Error, Debug)]
pub enum ProxyError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TLS error: {0}")]
    Tls(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Invalid URI: {0}")]
    InvalidUri(#[from] http::uri::InvalidUri),

    #[error("No private key found in key file")]
    NoPrivateKey,

    #[error("No backends configured")]
    NoBackends,

    #[error("No listeners configured")]
    NoListeners,

    #[error("Invalid matcher pattern {pattern:?}: {source}")]
    InvalidPattern { pattern: String, source: regex::Error },

    #[error("Control socket error: {0}")]
    Control(String),
}

pub type Result<T> = std::result::Result<T, ProxyError>;
