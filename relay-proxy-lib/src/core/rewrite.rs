use std::sync::Arc;

use super::backend::{BackEnd, BackendAddress};
use super::listener::Listener;
use super::service::Service;
use crate::config::RewriteLocation;

/// Outcome of the location-rewrite decision (`need_rewrite` → §4.10).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RewriteDecision {
    No,
    RewriteSameScheme,
    RewriteHttp,
    RewriteHttps,
}

/// Decides whether a back-end-emitted `Location` (or `Content-Location`,
/// `Destination`) header must be rewritten, and to which scheme, so that
/// clients are not exposed to back-end topology (§4.10 steps 1-9).
///
/// `listeners` is the full sibling listener list, needed by step 8's
/// any-listener scan for global services.
pub async fn decide(
    mode: RewriteLocation,
    location: &str,
    listener: &Listener,
    listeners: &[Arc<Listener>],
    backend: &BackEnd,
    service: &Service,
    host: Option<&str>,
) -> RewriteDecision {
    if mode == RewriteLocation::Off {
        return RewriteDecision::No;
    }

    // Rewriting only ever applies to INET/INET6 back-ends.
    let BackendAddress::Tcp(backend_addr) = &backend.address else {
        return RewriteDecision::No;
    };
    let backend_addr = *backend_addr;

    let Ok(parsed) = http::Uri::try_from(location) else {
        return RewriteDecision::No;
    };
    let Some(location_host) = parsed.host() else {
        // Relative location, nothing to rewrite.
        return RewriteDecision::No;
    };
    let scheme = parsed.scheme_str().unwrap_or("http");
    let default_port = if scheme.eq_ignore_ascii_case("https") { 443 } else { 80 };
    let port = parsed.port_u16().unwrap_or(default_port);
    let host_port = if location_host.contains(':') {
        format!("[{location_host}]:{port}")
    } else {
        format!("{location_host}:{port}")
    };

    let resolved = match crate::core::resolve::resolve(&host_port).await {
        Ok(addr) => addr,
        Err(_) => {
            // Resolution failed; fall back to an exact match against the
            // request's own Host header.
            let same_host =
                host.map(|h| strip_port(h).eq_ignore_ascii_case(location_host)).unwrap_or(false);
            return if same_host { RewriteDecision::RewriteSameScheme } else { RewriteDecision::No };
        }
    };

    if resolved.is_ipv4() != backend_addr.is_ipv4() {
        return RewriteDecision::No;
    }

    if resolved == backend_addr {
        return rewrite_to(listener.is_https(), scheme);
    }

    match mode {
        RewriteLocation::SameHostOnly => {
            if resolved.ip() == listener.address.ip()
                && (resolved.port() != listener.address.port()
                    || !scheme_matches(listener.is_https(), scheme))
            {
                return rewrite_to(listener.is_https(), scheme);
            }
        }
        RewriteLocation::AnyListener if service.global => {
            for candidate in listeners {
                if candidate.address.ip() != resolved.ip()
                    || candidate.address.port() != resolved.port()
                {
                    continue;
                }
                return if scheme_matches(candidate.is_https(), scheme) {
                    RewriteDecision::No
                } else {
                    rewrite_to(candidate.is_https(), scheme)
                };
            }
        }
        _ => {}
    }

    RewriteDecision::No
}

fn scheme_matches(is_https: bool, scheme: &str) -> bool {
    scheme.eq_ignore_ascii_case(if is_https { "https" } else { "http" })
}

fn rewrite_to(is_https: bool, scheme: &str) -> RewriteDecision {
    if scheme_matches(is_https, scheme) {
        RewriteDecision::RewriteSameScheme
    } else if is_https {
        RewriteDecision::RewriteHttps
    } else {
        RewriteDecision::RewriteHttp
    }
}

fn strip_port(host: &str) -> &str {
    host.split(':').next().unwrap_or(host)
}

/// Applies a [`RewriteDecision`] to `location`, substituting the scheme (and,
/// when the client's `Host` is known, the authority) so the client is never
/// redirected to back-end topology.
pub fn apply(decision: RewriteDecision, location: &str, host: Option<&str>) -> String {
    let Ok(parsed) = http::Uri::try_from(location) else { return location.to_string() };
    let Some(authority) = parsed.authority() else { return location.to_string() };

    let scheme = match decision {
        RewriteDecision::No => return location.to_string(),
        RewriteDecision::RewriteSameScheme => parsed.scheme_str().unwrap_or("http"),
        RewriteDecision::RewriteHttp => "http",
        RewriteDecision::RewriteHttps => "https",
    };
    let new_authority = host.unwrap_or(authority.as_str());
    let path_and_query = parsed.path_and_query().map(|pq| pq.as_str()).unwrap_or("/");
    format!("{scheme}://{new_authority}{path_and_query}")
}
