use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::watch;

use prometheus::IntGauge;

/// Guard to decrement active connections counter when dropped
/// Also notifies when the last connection closes (for graceful shutdown)
pub struct ConnectionGuard {
    counter: Arc<AtomicUsize>,
    notifier: Option<watch::Sender<()>>,
    connections_active: Option<IntGauge>,
}

impl ConnectionGuard {
    pub fn new(
        counter: Arc<AtomicUsize>,
        notifier: watch::Sender<()>,
        connections_active: Option<IntGauge>,
    ) -> Self {
        Self { counter, notifier: Some(notifier), connections_active }
    }
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        let remaining = self.counter.fetch_sub(1, Ordering::Relaxed);
        if let Some(ref gauge) = self.connections_active {
            gauge.dec();
        }
        // Notify when the last connection closes
        if remaining == 1 {
            if let Some(ref tx) = self.notifier {
                let _ = tx.send(());
            }
        }
    }
}

/// Guard to decrement TLS connection metrics counter when dropped.
/// Does NOT decrement the main active_connections counter; that's handled by [`ConnectionGuard`].
pub struct TlsConnectionGuard {
    tls_active: Option<IntGauge>,
}

impl TlsConnectionGuard {
    pub fn new(tls_active: Option<IntGauge>) -> Self {
        Self { tls_active }
    }
}

impl Drop for TlsConnectionGuard {
    fn drop(&mut self) {
        if let Some(ref gauge) = self.tls_active {
            gauge.dec();
        }
    }
}
