use std::sync::Arc;

use crate::config::Config;
use crate::error::Result;

use super::listener::Listener;
use super::router::Router;
use super::service::Service;
use super::updater::Updater;

/// Everything the proxy needs at runtime: the immutable listener/service
/// graph built once at configuration load, plus the stateless `Router` and
/// `Updater`. Shared via `Arc` with the accept loops, background loops, and
/// control server — never mutated after construction (§9).
pub struct RuntimeContext {
    pub listeners: Vec<Arc<Listener>>,
    /// Top-level services shared across every listener (`global = true`).
    pub global_services: Vec<Arc<Service>>,
    pub router: Router,
    pub updater: Updater,
}

impl RuntimeContext {
    pub async fn from_config(cfg: &Config) -> Result<Self> {
        let mut listeners = Vec::with_capacity(cfg.listener.len());
        for l in &cfg.listener {
            listeners.push(Arc::new(Listener::from_config(l).await?));
        }
        if listeners.is_empty() {
            return Err(crate::error::ProxyError::NoListeners);
        }

        let mut global_services = Vec::with_capacity(cfg.service.len());
        for s in &cfg.service {
            global_services.push(Arc::new(Service::from_config(s).await?));
        }

        Ok(Self { listeners, global_services, router: Router::new(), updater: Updater::new() })
    }

    /// Every service reachable from any listener, for the background loops,
    /// which apply the same pass to listener-owned and global services alike.
    pub fn all_services(&self) -> Vec<Arc<Service>> {
        let mut services: Vec<Arc<Service>> =
            self.listeners.iter().flat_map(|l| l.services.iter().cloned()).collect();
        services.extend(self.global_services.iter().cloned());
        services
    }
}
