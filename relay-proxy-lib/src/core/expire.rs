use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use super::service::{Service, SessionTtl};

/// One expiry sweep (§4.8): for every service with session affinity enabled
/// and a timed TTL, evict entries stale beyond their TTL (or death-TTL, for
/// tombstoned entries), dropping victims after the lock is released.
pub fn run_expire_pass(services: &[Arc<Service>]) {
    let now = Instant::now();
    for service in services {
        if service.session_policy.is_none() {
            continue;
        }
        let SessionTtl::Timed(ttl) = service.session_ttl else { continue };
        let death_ttl = service.death_ttl;

        let victims = match service.session_table.lock() {
            Ok(mut table) => table.evict_where(|session| {
                let last_access = session.last_access();
                let bound = if session.is_delete_pending() { death_ttl } else { ttl };
                now.duration_since(last_access) > bound
            }),
            Err(_) => {
                warn!(service = %service.name, "session table lock poisoned, skipping expiry sweep");
                continue;
            }
        };
        if !victims.is_empty() {
            debug!(service = %service.name, evicted = victims.len(), "expired session entries");
        }
    }
}

/// Runs the expiry loop until `shutdown` fires.
pub async fn run_expiry_loop(
    services: Arc<Vec<Arc<Service>>>,
    interval: Duration,
    mut shutdown: tokio::sync::watch::Receiver<bool>,
) {
    let mut ticker = tokio::time::interval(interval);
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                run_expire_pass(&services);
            }
            _ = shutdown.changed() => {
                if *shutdown.borrow() {
                    break;
                }
            }
        }
    }
}
