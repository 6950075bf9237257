use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::config::{ListenerConfig, RewriteLocation};
use crate::error::Result;

use super::matcher::{compile_all, Matcher};
use super::service::Service;

/// A bound socket plus the services eligible for requests arriving on it.
pub struct Listener {
    pub address: SocketAddr,
    pub tls: Option<crate::tls::setup::ListenerTls>,
    pub default_host: Option<String>,
    /// Listener-local services, declaration order preserved.
    pub services: Vec<Arc<Service>>,
    pub rewrite_location: RewriteLocation,
    pub rewrite_destination: bool,
    pub no_ssl_redirect: Option<String>,
    pub force_http10: Vec<Matcher>,
    pub disabled: AtomicBool,
    pub preserve_host: bool,
}

impl Listener {
    pub async fn from_config(cfg: &ListenerConfig) -> Result<Self> {
        let mut services = Vec::with_capacity(cfg.service.len());
        for s in &cfg.service {
            services.push(Arc::new(Service::from_config(s).await?));
        }
        let force_http10 = compile_all(&cfg.force_http10)?;
        let tls = cfg.tls.as_ref().map(crate::tls::setup::ListenerTls::from_config).transpose()?;

        Ok(Self {
            address: cfg.address,
            tls,
            default_host: cfg.default_host.clone(),
            services,
            rewrite_location: cfg.rewrite_location,
            rewrite_destination: cfg.rewrite_destination,
            no_ssl_redirect: cfg.no_ssl_redirect.clone(),
            force_http10,
            disabled: AtomicBool::new(cfg.disabled),
            preserve_host: cfg.preserve_host,
        })
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled.load(Ordering::Acquire)
    }

    pub fn set_disabled(&self, disabled: bool) {
        self.disabled.store(disabled, Ordering::Release);
    }

    pub fn is_https(&self) -> bool {
        self.tls.is_some()
    }
}
