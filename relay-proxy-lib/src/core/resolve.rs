use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Mutex, OnceLock};
use std::time::{Duration, Instant};

use crate::error::{ProxyError, Result};

const DNS_CACHE_MIN_TTL: Duration = Duration::from_secs(30);
const DNS_CACHE_MAX_TTL: Duration = Duration::from_secs(3600);

#[derive(Debug, Clone)]
struct CacheEntry {
    address: SocketAddr,
    expires_at: Instant,
}

impl CacheEntry {
    fn is_expired(&self) -> bool {
        Instant::now() > self.expires_at
    }
}

/// Caches host-to-`SocketAddr` lookups so repeated config reloads and HA
/// re-probes don't re-resolve the same hostname on every call. The standard
/// resolver doesn't surface record TTLs, so entries are just clamped to
/// `[DNS_CACHE_MIN_TTL, DNS_CACHE_MAX_TTL]` from the time of lookup.
fn cache() -> &'static Mutex<HashMap<String, CacheEntry>> {
    static CACHE: OnceLock<Mutex<HashMap<String, CacheEntry>>> = OnceLock::new();
    CACHE.get_or_init(|| Mutex::new(HashMap::new()))
}

/// Resolve `host:port` to a `SocketAddr`, using a literal-address fast path
/// (no DNS round trip for `SocketAddr`-shaped input) and a cached lookup via
/// [`tokio::net::lookup_host`] otherwise. Used at configuration time for
/// back-end and HA-probe addresses (`§4.1`, `§4.9`).
pub async fn resolve(host_port: &str) -> Result<SocketAddr> {
    if let Ok(addr) = host_port.parse::<SocketAddr>() {
        return Ok(addr);
    }

    let key = host_port.to_string();
    if let Ok(guard) = cache().lock() {
        if let Some(entry) = guard.get(&key) {
            if !entry.is_expired() {
                return Ok(entry.address);
            }
        }
    }

    let mut addrs = tokio::net::lookup_host(host_port)
        .await
        .map_err(|e| ProxyError::Config(format!("failed to resolve {host_port:?}: {e}")))?;
    let address = addrs
        .next()
        .ok_or_else(|| ProxyError::Config(format!("no addresses found for {host_port:?}")))?;

    let expires_at = clamp_ttl(DNS_CACHE_MAX_TTL);
    if let Ok(mut guard) = cache().lock() {
        guard.insert(key, CacheEntry { address, expires_at });
    }

    Ok(address)
}

/// Without per-record TTL from the standard resolver, every lookup is
/// cached for `ttl`, itself clamped to `[DNS_CACHE_MIN_TTL, DNS_CACHE_MAX_TTL]`.
fn clamp_ttl(ttl: Duration) -> Instant {
    let clamped = ttl.clamp(DNS_CACHE_MIN_TTL, DNS_CACHE_MAX_TTL);
    Instant::now().checked_add(clamped).unwrap_or_else(Instant::now)
}
