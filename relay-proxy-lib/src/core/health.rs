use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::{debug, warn};

use super::backend::{BackendAddress, BackendStateChange};
use super::service::Service;

/// One probe attempt against `addr`, bounded by `connect_timeout`.
async fn probe(addr: &BackendAddress, connect_timeout: Duration) -> bool {
    let BackendAddress::Tcp(addr) = addr else {
        // Unix-socket back-ends are always considered reachable; there is no
        // connect-refused failure mode analogous to a dead TCP listener.
        return true;
    };
    matches!(timeout(connect_timeout, TcpStream::connect(addr)).await, Ok(Ok(_)))
}

/// Runs both health-check passes (§4.7) once over every service reachable
/// from `services` (listener-owned and global, already chained by the caller
/// — there is one helper, not two near-duplicate passes per §9).
pub async fn run_health_pass(services: &[Arc<Service>], connect_timeout: Duration) {
    for service in services {
        // Pass 1: kill alive back-ends whose HA probe fails.
        for backend in &service.backends {
            if !backend.is_alive() || backend.ha_address.is_none() {
                continue;
            }
            let ha = backend.ha_address.as_ref().unwrap();
            if !probe(ha, connect_timeout).await {
                debug!(service = %service.name, backend = %backend.address, "HA probe failed, killing backend");
                service.set_backend_state(backend, BackendStateChange::Kill);
            }
        }

        // Pass 2: resurrect dead back-ends whose probe address answers.
        let mut resurrected = Vec::new();
        for backend in &service.backends {
            if backend.is_alive() {
                continue;
            }
            let probe_addr = backend.ha_address.as_ref().unwrap_or(&backend.address);
            if probe(probe_addr, connect_timeout).await {
                resurrected.push(backend);
            }
        }
        for backend in resurrected {
            debug!(service = %service.name, backend = %backend.address, "backend resurrected");
            service.resurrect_backend(backend);
        }
    }
}

/// Runs the health loop until `shutdown` fires.
pub async fn run_health_loop(
    services: Arc<Vec<Arc<Service>>>,
    interval: Duration,
    connect_timeout: Duration,
    mut shutdown: tokio::sync::watch::Receiver<bool>,
) {
    let mut ticker = tokio::time::interval(interval);
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                run_health_pass(&services, connect_timeout).await;
            }
            _ = shutdown.changed() => {
                if *shutdown.borrow() {
                    warn!("health loop shutting down");
                    break;
                }
            }
        }
    }
}
