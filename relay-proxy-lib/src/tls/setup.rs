use std::sync::Arc;

use tokio::sync::watch;
use tokio_rustls::rustls::ServerConfig;
use tokio_rustls::TlsAcceptor;
use tracing::warn;

use crate::config::TlsConfig;
use crate::error::Result;

use super::acceptor::build_server_config;
use super::reloader::{watch_and_build, CertReloader};

/// A listener's TLS acceptor, hot-reloaded on certificate file changes and
/// periodically rebuilt to rotate the TLS 1.3 session-ticket key (the key
/// rotation loop, see `RuntimeContext::run_key_rotation_loop`).
pub struct ListenerTls {
    cfg: Arc<TlsConfig>,
    tx: watch::Sender<Arc<ServerConfig>>,
    rx: watch::Receiver<Arc<ServerConfig>>,
    _reloader: CertReloader,
}

impl ListenerTls {
    pub fn from_config(cfg: &TlsConfig) -> Result<Self> {
        let cfg = Arc::new(cfg.clone());
        let (tx, rx, reloader) = watch_and_build(cfg.clone())?;
        Ok(Self { cfg, tx, rx, _reloader: reloader })
    }

    /// Current TLS acceptor, built from whichever certificate/ticket key is live right now.
    pub fn acceptor(&self) -> TlsAcceptor {
        TlsAcceptor::from(self.rx.borrow().clone())
    }

    /// How often this listener's session-ticket key should be rotated.
    pub fn key_rotation_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.cfg.key_rotation_secs)
    }

    /// Rebuild the server config from the same certificate files, picking a
    /// fresh session-ticket key in the process. Called by the key rotation loop.
    pub fn rotate_ticket_key(&self) {
        match build_server_config(&self.cfg) {
            Ok(new_config) => {
                let _ = self.tx.send(new_config);
            }
            Err(e) => warn!(error = %e, "failed to rotate TLS session-ticket key"),
        }
    }
}
