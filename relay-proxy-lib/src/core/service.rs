use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use regex::Regex;

use crate::config::{HeaderManipulation, RouteRateLimitConfig, ServiceConfig, SessionPolicyConfig};
use crate::error::{ProxyError, Result};

use super::backend::{BackEnd, BackendStateChange};
use super::matcher::{compile_all, Matcher};
use super::session::{Session, SessionTable, KEY_SIZE};

/// How a service extracts a session-affinity key from a request/response.
/// A closed sum type, matched directly — not a trait object.
#[derive(Debug, Clone)]
pub enum SessionPolicy {
    None,
    ClientIp,
    Cookie(String),
    UrlParam(String),
    UrlPathParam(String),
    HttpBasic,
    Header(String),
}

impl SessionPolicy {
    fn from_config(cfg: &SessionPolicyConfig) -> Self {
        match cfg {
            SessionPolicyConfig::None => SessionPolicy::None,
            SessionPolicyConfig::ClientIp => SessionPolicy::ClientIp,
            SessionPolicyConfig::Cookie { name } => SessionPolicy::Cookie(name.clone()),
            SessionPolicyConfig::UrlParam { name } => SessionPolicy::UrlParam(name.clone()),
            SessionPolicyConfig::UrlPathParam { name } => {
                SessionPolicy::UrlPathParam(name.clone())
            }
            SessionPolicyConfig::HttpBasic => SessionPolicy::HttpBasic,
            SessionPolicyConfig::Header { name } => SessionPolicy::Header(name.clone()),
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, SessionPolicy::None)
    }
}

/// A negative configured TTL selects consistent-hash routing instead of a
/// timed session table.
#[derive(Debug, Clone, Copy)]
pub enum SessionTtl {
    Timed(Duration),
    ConsistentHash,
}

/// A routing rule: a matcher pipeline plus a session policy and a back-end list.
pub struct Service {
    pub name: String,
    pub url: Vec<Matcher>,
    pub headers_require: Vec<Matcher>,
    pub headers_deny: Vec<Matcher>,
    pub session_policy: SessionPolicy,
    pub sess_start: Option<Regex>,
    pub sess_pattern: Option<Regex>,
    pub end_of_session: Option<Matcher>,
    pub session_ttl: SessionTtl,
    pub death_ttl: Duration,
    pub lb_info_header: Option<Matcher>,
    /// Cookie name carrying an explicit back-end selection (`bekey`).
    pub becookie: Option<String>,
    pub dynamic_rescale: bool,
    /// Declaration order preserved; load-bearing for consistent hashing.
    pub backends: Vec<Arc<BackEnd>>,
    pub emergency_backend: Option<Arc<BackEnd>>,
    pub session_table: Mutex<SessionTable>,
    pub abs_pri: AtomicI64,
    pub tot_pri: AtomicI64,
    pub request_count: AtomicU64,
    pub disabled: AtomicBool,
    /// Defined at top level (shared by every listener) vs. inside one listener.
    pub global: bool,
    pub rate_limit: Option<RouteRateLimitConfig>,
    pub headers: Option<HeaderManipulation>,
}

impl Service {
    pub async fn from_config(cfg: &ServiceConfig) -> Result<Self> {
        let url = compile_all(&cfg.url_match)?;
        let headers_require = compile_all(&cfg.headers_require)?;
        let headers_deny = compile_all(&cfg.headers_deny)?;
        let end_of_session = cfg.end_of_session.as_ref().map(Matcher::compile).transpose()?;
        let lb_info_header = cfg.lb_info_header.as_ref().map(Matcher::compile).transpose()?;

        let sess_start = cfg
            .session_start
            .as_deref()
            .map(Regex::new)
            .transpose()
            .map_err(|source| ProxyError::InvalidPattern {
                pattern: cfg.session_start.clone().unwrap_or_default(),
                source,
            })?;
        let sess_pattern = cfg
            .session_pattern
            .as_deref()
            .map(Regex::new)
            .transpose()
            .map_err(|source| ProxyError::InvalidPattern {
                pattern: cfg.session_pattern.clone().unwrap_or_default(),
                source,
            })?;

        let mut backends = Vec::with_capacity(cfg.backend.len());
        for b in &cfg.backend {
            backends.push(Arc::new(BackEnd::from_config(b).await?));
        }
        let emergency_backend = match &cfg.emergency_backend {
            Some(b) => Some(Arc::new(BackEnd::from_config(b).await?)),
            None => None,
        };

        let abs_pri: i64 = backends.iter().map(|b| b.priority()).sum();
        let tot_pri: i64 = backends
            .iter()
            .filter(|b| b.is_routable())
            .map(|b| b.priority())
            .sum();

        let session_ttl = if cfg.session_ttl_secs < 0 {
            SessionTtl::ConsistentHash
        } else {
            SessionTtl::Timed(Duration::from_secs(cfg.session_ttl_secs as u64))
        };

        Ok(Self {
            name: cfg.name.clone(),
            url,
            headers_require,
            headers_deny,
            session_policy: SessionPolicy::from_config(&cfg.session),
            sess_start,
            sess_pattern,
            end_of_session,
            session_ttl,
            death_ttl: Duration::from_secs(cfg.death_ttl_secs),
            lb_info_header,
            becookie: cfg.becookie.clone(),
            dynamic_rescale: cfg.dynamic_rescale,
            backends,
            emergency_backend,
            session_table: Mutex::new(SessionTable::new()),
            abs_pri: AtomicI64::new(abs_pri),
            tot_pri: AtomicI64::new(tot_pri),
            request_count: AtomicU64::new(0),
            disabled: AtomicBool::new(cfg.disabled),
            global: cfg.global,
            rate_limit: cfg.rate_limit.clone(),
            headers: cfg.headers.clone(),
        })
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled.load(Ordering::Acquire)
    }

    pub fn set_disabled(&self, disabled: bool) {
        self.disabled.store(disabled, Ordering::Release);
    }

    /// Does this request's method/target/headers match this service?
    pub fn matches(&self, target: &str, headers: &http::HeaderMap) -> bool {
        if self.is_disabled() {
            return false;
        }
        if !self.url.iter().all(|m| m.is_match(target)) {
            return false;
        }
        for require in &self.headers_require {
            let any_match = headers
                .iter()
                .any(|(_, v)| v.to_str().map(|s| require.is_match(s)).unwrap_or(false));
            if !any_match {
                return false;
            }
        }
        for deny in &self.headers_deny {
            let any_match = headers
                .iter()
                .any(|(_, v)| v.to_str().map(|s| deny.is_match(s)).unwrap_or(false));
            if any_match {
                return false;
            }
        }
        true
    }

    /// Recompute `tot_pri` from current back-end liveness/disabled state
    /// (§4.4). `abs_pri` only changes when the rescale loop mutates a
    /// back-end's priority, so it is adjusted incrementally there instead.
    pub fn recompute_tot_pri(&self) {
        let tot: i64 = self.backends.iter().filter(|b| b.is_routable()).map(|b| b.priority()).sum();
        self.tot_pri.store(tot, Ordering::Release);
    }

    /// `kill_be` → the single entry point for back-end state transitions.
    pub fn set_backend_state(&self, backend: &Arc<BackEnd>, mode: BackendStateChange) {
        match mode {
            BackendStateChange::Disable => {
                backend.disabled.store(true, Ordering::Release);
                self.recompute_tot_pri();
            }
            BackendStateChange::Enable => {
                backend.disabled.store(false, Ordering::Release);
                self.recompute_tot_pri();
            }
            BackendStateChange::Kill => {
                backend.alive.store(false, Ordering::Release);
                match self.session_table.lock() {
                    Ok(mut table) => {
                        let _victims = table.evict_backend(backend);
                    }
                    Err(_) => tracing::warn!(
                        service = %self.name,
                        "session table lock poisoned while evicting killed backend"
                    ),
                }
                self.recompute_tot_pri();
            }
        }
    }

    /// Mark a back-end resurrected by the health loop (alive := true, not
    /// the same as `Enable`, which only clears the operator's disabled flag).
    pub fn resurrect_backend(&self, backend: &Arc<BackEnd>) {
        backend.alive.store(true, Ordering::Release);
        self.recompute_tot_pri();
    }

    pub fn truncate_key(key: &str) -> String {
        if key.len() <= KEY_SIZE {
            key.to_string()
        } else {
            key.chars().take(KEY_SIZE).collect()
        }
    }

    pub fn client_addr_key(addr: SocketAddr) -> String {
        addr.ip().to_string()
    }
}
