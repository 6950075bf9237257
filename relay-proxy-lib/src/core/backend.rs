use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use http::StatusCode;
use tokio_rustls::rustls::ClientConfig;

use crate::config::{BackendConfig, BackendHttpVersion, BackendKind as BackendKindConfig, RedirectMode};
use crate::error::{ProxyError, Result};

/// An address a back-end (or its HA probe) can be reached at.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum BackendAddress {
    Tcp(SocketAddr),
    Unix(PathBuf),
}

impl BackendAddress {
    /// Resolve a configured address string to a `BackendAddress`. Accepts a
    /// literal `SocketAddr` (no DNS needed), a `host:port` pair resolved via
    /// the cached address resolver (`crate::core::resolve`), or a
    /// `unix:`-prefixed path.
    async fn resolve(raw: &str) -> Result<Self> {
        if let Some(path) = raw.strip_prefix("unix:") {
            return Ok(BackendAddress::Unix(PathBuf::from(path)));
        }
        crate::core::resolve::resolve(raw).await.map(BackendAddress::Tcp)
    }
}

impl std::fmt::Display for BackendAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendAddress::Tcp(addr) => write!(f, "{addr}"),
            BackendAddress::Unix(path) => write!(f, "unix:{}", path.display()),
        }
    }
}

/// How a back-end behaves when selected.
#[derive(Debug, Clone)]
pub enum BackendKind {
    Normal,
    Redirect { status: StatusCode, target: String, mode: RedirectMode },
}

/// Latency and response-class counters for one back-end.
///
/// Updated and read together as a unit (the rescale loop's mean/stddev
/// snapshot needs them mutually consistent), so they share one mutex
/// separate from the `alive`/`disabled` atomics read on every request.
#[derive(Debug, Default)]
pub struct BackendCounters {
    pub n_requests: u64,
    pub t_requests: f64,
    pub t_average: f64,
    /// Indexed by (status / 100) - 1, i.e. [1xx, 2xx, 3xx, 4xx, 5xx].
    pub class_counts: [u64; 5],
}

const RESCALE_MAX: u64 = 10_000;

impl BackendCounters {
    pub fn record(&mut self, elapsed: Duration, status: StatusCode) {
        self.t_requests += elapsed.as_secs_f64();
        self.n_requests += 1;
        if self.n_requests > RESCALE_MAX {
            self.t_requests /= 2.0;
            self.n_requests /= 2;
        }
        self.t_average = self.t_requests / self.n_requests as f64;

        let class = (status.as_u16() / 100).saturating_sub(1) as usize;
        if class < self.class_counts.len() {
            self.class_counts[class] += 1;
        }
    }
}

/// One upstream endpoint.
pub struct BackEnd {
    pub address: BackendAddress,
    pub ha_address: Option<BackendAddress>,
    /// Configured routing weight. 0 means "defined but never selected".
    /// Mutated in place by the rescale loop (`§4.9`), hence atomic.
    pub priority: AtomicI64,
    pub alive: AtomicBool,
    pub disabled: AtomicBool,
    pub connect_timeout: Duration,
    pub read_timeout: Duration,
    pub write_timeout: Duration,
    pub kind: BackendKind,
    pub http_version: Option<BackendHttpVersion>,
    pub tls_client_config: Option<Arc<ClientConfig>>,
    pub counters: Mutex<BackendCounters>,
    pub bekey: Option<String>,
}

impl BackEnd {
    pub async fn from_config(cfg: &BackendConfig) -> Result<Self> {
        let address = BackendAddress::resolve(&cfg.address).await?;
        let ha_address = match cfg.ha_address.as_deref() {
            Some(raw) => Some(BackendAddress::resolve(raw).await?),
            None => None,
        };
        let kind = match &cfg.kind {
            BackendKindConfig::Normal => BackendKind::Normal,
            BackendKindConfig::Redirect { status, target, mode } => BackendKind::Redirect {
                status: StatusCode::from_u16(*status)
                    .map_err(|e| ProxyError::Config(format!("invalid redirect status: {e}")))?,
                target: target.clone(),
                mode: *mode,
            },
        };
        let tls_client_config = if cfg.tls {
            Some(crate::tls::backend::client_config(cfg.tls_ca_cert_path.as_deref())?)
        } else {
            None
        };

        Ok(Self {
            address,
            ha_address,
            priority: AtomicI64::new(cfg.priority),
            alive: AtomicBool::new(true),
            disabled: AtomicBool::new(false),
            connect_timeout: Duration::from_millis(cfg.connect_timeout_ms),
            read_timeout: Duration::from_millis(cfg.read_timeout_ms),
            write_timeout: Duration::from_millis(cfg.write_timeout_ms),
            kind,
            http_version: cfg.http_version,
            tls_client_config,
            counters: Mutex::new(BackendCounters::default()),
            bekey: cfg.bekey.clone(),
        })
    }

    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::Acquire)
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled.load(Ordering::Acquire)
    }

    pub fn is_routable(&self) -> bool {
        self.is_alive() && !self.is_disabled()
    }

    pub fn priority(&self) -> i64 {
        self.priority.load(Ordering::Relaxed)
    }

    pub fn record_response(&self, elapsed: Duration, status: StatusCode) {
        match self.counters.lock() {
            Ok(mut counters) => counters.record(elapsed, status),
            Err(_) => tracing::warn!("backend counters lock poisoned, dropping sample"),
        }
    }
}

/// Mode passed to [`crate::core::service::Service::set_backend_state`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendStateChange {
    Disable,
    Kill,
    Enable,
}
