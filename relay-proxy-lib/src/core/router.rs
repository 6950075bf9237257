use std::net::SocketAddr;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use http::request::Parts;
use rand::Rng;

use super::backend::BackEnd;
use super::listener::Listener;
use super::service::{Service, SessionPolicy, SessionTtl};
use super::session::Session;

/// The outcome of a back-end selection: the chosen back-end (if any), the
/// session key it was resolved under (if the service has session affinity),
/// and the `Session` record involved, if one exists.
pub struct SelectOutcome {
    pub backend: Option<Arc<BackEnd>>,
    pub session_key: Option<String>,
    pub session: Option<Arc<Session>>,
}

/// FNV-1a, 32-bit. Used only for consistent-hash back-end selection — never
/// for the session table's underlying `HashMap`, which uses `ahash`.
fn fnv1a_32(data: &[u8]) -> u32 {
    const OFFSET_BASIS: u32 = 0x811c_9dc5;
    const PRIME: u32 = 0x0100_0193;
    let mut hash = OFFSET_BASIS;
    for byte in data {
        hash ^= *byte as u32;
        hash = hash.wrapping_mul(PRIME);
    }
    hash
}

/// The per-request decision function: picks a service, then a back-end.
#[derive(Default)]
pub struct Router;

impl Router {
    pub fn new() -> Self {
        Self
    }

    /// Scans the listener's services in declaration order, then the global
    /// services list. First match wins (§4.1).
    pub fn get_service(
        &self,
        listener: &Listener,
        global_services: &[Arc<Service>],
        target: &str,
        headers: &http::HeaderMap,
    ) -> Option<Arc<Service>> {
        listener
            .services
            .iter()
            .chain(global_services.iter())
            .find(|s| s.matches(target, headers))
            .cloned()
    }

    /// Extracts a session key per §4.2. Returns `None` when the policy is
    /// `None`, or when the configured pattern doesn't match (falls back to
    /// weighted random, except `ClientIp`, which cannot miss).
    fn extract_session_key(
        &self,
        service: &Service,
        client_addr: SocketAddr,
        req: &Parts,
        user: Option<&str>,
    ) -> Option<String> {
        let start = service.sess_start.as_ref()?;
        let pattern = service.sess_pattern.as_ref()?;

        let key = match &service.session_policy {
            SessionPolicy::None => return None,
            SessionPolicy::ClientIp => return Some(Service::client_addr_key(client_addr)),
            SessionPolicy::UrlParam(_) | SessionPolicy::UrlPathParam(_) => {
                let line = req.uri.path_and_query().map(|pq| pq.as_str()).unwrap_or("");
                if !start.is_match(line) {
                    return None;
                }
                pattern.captures(line)?.get(1)?.as_str().to_string()
            }
            SessionPolicy::Cookie(_name) => {
                let source = last_header_value(&req.headers, http::header::COOKIE.as_str())?;
                if !start.is_match(&source) {
                    return None;
                }
                pattern.captures(&source)?.get(1)?.as_str().to_string()
            }
            SessionPolicy::Header(name) => {
                let source = last_header_value(&req.headers, name)?;
                if !start.is_match(&source) {
                    return None;
                }
                pattern.captures(&source)?.get(1)?.as_str().to_string()
            }
            SessionPolicy::HttpBasic => {
                let source = user?;
                if !start.is_match(source) {
                    return None;
                }
                pattern.captures(source)?.get(1)?.as_str().to_string()
            }
        };
        Some(Service::truncate_key(&key))
    }

    /// Draw uniformly from `0..tot_pri`, walk back-ends skipping dead/disabled.
    fn select_random(service: &Service) -> Option<Arc<BackEnd>> {
        let tot_pri = service.tot_pri.load(Ordering::Acquire);
        if tot_pri <= 0 {
            return None;
        }
        let target = rand::rng().random_range(0..tot_pri);
        let mut cumulative = 0i64;
        for backend in &service.backends {
            if !backend.is_routable() {
                continue;
            }
            cumulative += backend.priority();
            if cumulative > target {
                return Some(backend.clone());
            }
        }
        None
    }

    /// Deterministic selection over `abs_pri`, stable under membership change.
    fn select_hash(service: &Service, key: &str) -> Option<Arc<BackEnd>> {
        let abs_pri = service.abs_pri.load(Ordering::Acquire);
        if abs_pri <= 0 {
            return None;
        }
        let reduced = (fnv1a_32(key.as_bytes()) as i64) % abs_pri;
        let n = service.backends.len();
        let mut cumulative = 0i64;
        let mut chosen = None;
        for (i, backend) in service.backends.iter().enumerate() {
            cumulative += backend.priority();
            if cumulative > reduced {
                chosen = Some(i);
                break;
            }
        }
        let start = chosen?;
        for offset in 0..n {
            let candidate = &service.backends[(start + offset) % n];
            if candidate.is_routable() {
                return Some(candidate.clone());
            }
        }
        None
    }

    /// Explicit cookie-based back-end selection, falling back to weighted random.
    fn select_bekey(service: &Service, req: &Parts) -> Option<Arc<BackEnd>> {
        let cookie_name = service.becookie.as_ref()?;
        let cookie_header = last_header_value(&req.headers, http::header::COOKIE.as_str())?;
        let value = extract_cookie_value(&cookie_header, cookie_name)?;
        service
            .backends
            .iter()
            .find(|b| b.bekey.as_deref() == Some(value.as_str()) && b.is_alive())
            .cloned()
    }

    /// Chooses a back-end for `service` given the current request, honoring
    /// session affinity, consistent hashing, explicit bekey selection, and
    /// emergency routing (§4.3).
    pub fn get_backend(
        &self,
        service: &Service,
        client_addr: SocketAddr,
        req: &Parts,
        user: Option<&str>,
    ) -> SelectOutcome {
        if service.tot_pri.load(Ordering::Acquire) <= 0 {
            return SelectOutcome {
                backend: service.emergency_backend.clone(),
                session_key: None,
                session: None,
            };
        }

        if let SessionTtl::ConsistentHash = service.session_ttl {
            if let Some(key) = self.extract_session_key(service, client_addr, req, user) {
                let backend = Self::select_hash(service, &key);
                return SelectOutcome { backend, session_key: Some(key), session: None };
            }
            let backend = Self::select_random(service);
            return SelectOutcome { backend, session_key: None, session: None };
        }

        // Bekey is an explicit affinity override on top of the table-backed
        // session policies; consistent-hash services never consult it (the
        // hash itself is already deterministic/minimal-disruption).
        if let Some(backend) = Self::select_bekey(service, req) {
            return SelectOutcome { backend: Some(backend), session_key: None, session: None };
        }

        if service.session_policy.is_none() {
            let backend = Self::select_random(service);
            return SelectOutcome { backend, session_key: None, session: None };
        }

        let Some(key) = self.extract_session_key(service, client_addr, req, user) else {
            let backend = Self::select_random(service);
            return SelectOutcome { backend, session_key: None, session: None };
        };

        let existing = match service.session_table.lock() {
            Ok(table) => table.get(&key),
            Err(_) => {
                tracing::warn!(service = %service.name, "session table lock poisoned, treating as miss");
                None
            }
        };

        if let Some(session) = existing {
            let url = req.uri.path();
            session.touch(Some(client_addr.ip()), url, user);
            return SelectOutcome {
                backend: Some(session.backend.clone()),
                session_key: Some(key),
                session: Some(session),
            };
        }

        let backend = Self::select_random(service);
        let Some(backend) = backend else {
            return SelectOutcome {
                backend: service.emergency_backend.clone(),
                session_key: Some(key),
                session: None,
            };
        };

        let session = Arc::new(Session::new(key.clone(), backend.clone(), Some(client_addr.ip())));
        session.touch(Some(client_addr.ip()), req.uri.path(), user);
        match service.session_table.lock() {
            Ok(mut table) => {
                table.insert(session.clone());
            }
            Err(_) => tracing::warn!(
                service = %service.name,
                "session table lock poisoned, new binding not persisted"
            ),
        }

        SelectOutcome { backend: Some(backend), session_key: Some(key), session: Some(session) }
    }
}

fn last_header_value(headers: &http::HeaderMap, name: &str) -> Option<String> {
    headers
        .iter()
        .filter(|(k, _)| k.as_str().eq_ignore_ascii_case(name))
        .last()?
        .1
        .to_str()
        .ok()
        .map(String::from)
}

fn extract_cookie_value(cookie_header: &str, name: &str) -> Option<String> {
    cookie_header.split(';').find_map(|pair| {
        let pair = pair.trim();
        let (k, v) = pair.split_once('=')?;
        if k.trim() == name {
            Some(v.trim().to_string())
        } else {
            None
        }
    })
}
