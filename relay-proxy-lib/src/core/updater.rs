use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use http::request::Parts;
use http::{HeaderMap, StatusCode};

use super::backend::BackEnd;
use super::service::{Service, SessionTtl};
use super::session::Session;

/// Post-response hook: finalizes session affinity and records per-back-end
/// latency/response-class samples (§4.5, §4.9's `upd_be`).
#[derive(Default)]
pub struct Updater;

impl Updater {
    pub fn new() -> Self {
        Self
    }

    /// Runs after response headers are parsed. For header/cookie affinity
    /// modes, may end a session, create one, or record an LB-info header
    /// value. Returns whether the end-of-session condition fired.
    #[allow(clippy::too_many_arguments)]
    pub fn update_session(
        &self,
        service: &Service,
        client_addr: SocketAddr,
        req: &Parts,
        _status: StatusCode,
        resp_headers: &HeaderMap,
        user: Option<&str>,
        backend: &Arc<BackEnd>,
        session: Option<&Arc<Session>>,
        session_key: Option<&str>,
    ) -> bool {
        if service.session_policy.is_none() {
            self.record_lb_info(service, resp_headers, session);
            return false;
        }

        if let Some(end_of_session) = &service.end_of_session {
            let fired = resp_headers
                .iter()
                .any(|(_, v)| v.to_str().map(|s| end_of_session.is_match(s)).unwrap_or(false));
            if fired {
                if let Some(session) = session {
                    session.mark_delete_pending();
                    if service.death_ttl <= Duration::ZERO {
                        if let Ok(mut table) = service.session_table.lock() {
                            let key = session_key.unwrap_or(&session.key);
                            table.remove(key);
                        }
                    }
                }
                self.record_lb_info(service, resp_headers, session);
                return true;
            }
        }

        // Consistent-hash services route by key without a session table
        // (§4.6): a bare key with no session record here means the router
        // hashed it, not that a binding needs to be created.
        if session.is_none() && matches!(service.session_ttl, SessionTtl::Timed(_)) {
            if let Some(key) = session_key {
                let new_session =
                    Arc::new(Session::new(key.to_string(), backend.clone(), Some(client_addr.ip())));
                new_session.touch(Some(client_addr.ip()), req.uri.path(), user);
                if let Ok(mut table) = service.session_table.lock() {
                    if table.get(key).is_none() {
                        table.insert(new_session.clone());
                    }
                }
                self.record_lb_info(service, resp_headers, Some(&new_session));
                return false;
            }
        }

        self.record_lb_info(service, resp_headers, session);
        false
    }

    fn record_lb_info(&self, service: &Service, resp_headers: &HeaderMap, session: Option<&Arc<Session>>) {
        let Some(session) = session else { return };
        let Some(matcher) = &service.lb_info_header else { return };
        for (_, value) in resp_headers.iter() {
            let Ok(value) = value.to_str() else { continue };
            if let Some(capture) = matcher.capture(value) {
                session.set_lb_info(capture);
                break;
            }
        }
    }

    /// `upd_be`: record one completed request's latency/status against `backend`.
    pub fn update_backend_stats(&self, backend: &Arc<BackEnd>, elapsed: Duration, status: StatusCode) {
        backend.record_response(elapsed, status);
    }
}
