use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use http::{HeaderName, HeaderValue};
use hyper::body::Incoming;
use hyper::Request;
use std::net::SocketAddr;

const FORWARDED_FOR: HeaderName = HeaderName::from_static("x-forwarded-for");
const FORWARDED_HOST: HeaderName = HeaderName::from_static("x-forwarded-host");
const FORWARDED_PORT: HeaderName = HeaderName::from_static("x-forwarded-port");
const FORWARDED_PROTO: HeaderName = HeaderName::from_static("x-forwarded-proto");

/// Add X-Forwarded-* headers to the request.
///
/// - Appends client IP to X-Forwarded-For (or creates it if missing)
/// - Sets X-Forwarded-Host from the request's Host header
/// - Sets X-Forwarded-Port from the peer's port
/// - Sets X-Forwarded-Proto based on `is_https`
pub fn add_forwarded_headers(req: &mut Request<Incoming>, peer: SocketAddr, is_https: bool) {
    let client_ip = peer.ip().to_string();
    if let Some(existing_for) = req.headers().get(&FORWARDED_FOR) {
        if let Ok(existing_str) = existing_for.to_str() {
            let new_value = format!("{existing_str}, {client_ip}");
            if let Ok(header_value) = HeaderValue::from_str(&new_value) {
                req.headers_mut().insert(FORWARDED_FOR, header_value);
            }
        }
    } else if let Ok(header_value) = HeaderValue::from_str(&client_ip) {
        req.headers_mut().insert(FORWARDED_FOR, header_value);
    }

    if let Some(host) = req.headers().get(http::header::HOST) {
        if let Ok(host_str) = host.to_str() {
            if let Ok(header_value) = HeaderValue::from_str(host_str) {
                req.headers_mut().insert(FORWARDED_HOST, header_value);
            }
        }
    }

    let port = peer.port().to_string();
    if let Ok(header_value) = HeaderValue::from_str(&port) {
        req.headers_mut().insert(FORWARDED_PORT, header_value);
    }

    let proto = if is_https { "https" } else { "http" };
    req.headers_mut().insert(FORWARDED_PROTO, HeaderValue::from_static(proto));
}

/// Extracts the username from a `Basic` `Authorization` header, for services
/// using `SessionPolicy::HttpBasic` affinity.
pub fn extract_basic_auth_user(headers: &http::HeaderMap) -> Option<String> {
    let value = headers.get(http::header::AUTHORIZATION)?.to_str().ok()?;
    let encoded = value.strip_prefix("Basic ")?;
    let decoded = STANDARD.decode(encoded).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (user, _pass) = decoded.split_once(':')?;
    Some(user.to_string())
}
