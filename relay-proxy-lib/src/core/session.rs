use std::net::IpAddr;
use std::sync::{Arc, Mutex};
use std::time::Instant;

use ahash::AHashMap;

use super::backend::BackEnd;

/// Fixed cap mirroring the original's fixed-size key/url/user buffers.
pub const KEY_SIZE: usize = 256;

fn truncate(s: &str, max: usize) -> String {
    if s.len() <= max {
        s.to_string()
    } else {
        s.chars().take(max).collect()
    }
}

/// Mutable fields of a [`Session`], guarded by one mutex.
#[derive(Debug)]
pub struct SessionState {
    pub last_access: Instant,
    pub request_count: u64,
    pub last_client_addr: Option<IpAddr>,
    pub last_url: String,
    pub last_user: String,
    pub lb_info: Option<String>,
    /// >= 1 means tombstoned, awaiting death-TTL eviction.
    pub delete_pending: u32,
}

/// An affinity binding from a session key to a back-end.
///
/// The key and the bound back-end are set once at construction and read
/// without locking; only [`SessionState`] is mutable.
pub struct Session {
    pub key: String,
    pub backend: Arc<BackEnd>,
    pub first_access: Instant,
    state: Mutex<SessionState>,
}

impl Session {
    pub fn new(key: String, backend: Arc<BackEnd>, client_addr: Option<IpAddr>) -> Self {
        let now = Instant::now();
        Self {
            key,
            backend,
            first_access: now,
            state: Mutex::new(SessionState {
                last_access: now,
                request_count: 0,
                last_client_addr: client_addr,
                last_url: String::new(),
                last_user: String::new(),
                lb_info: None,
                delete_pending: 0,
            }),
        }
    }

    /// Record a request against this session: bumps `last_access` and
    /// `request_count`, and remembers the client address/URL/user.
    pub fn touch(&self, client_addr: Option<IpAddr>, url: &str, user: Option<&str>) {
        let Ok(mut state) = self.state.lock() else {
            tracing::warn!("session state lock poisoned, skipping touch");
            return;
        };
        state.last_access = Instant::now();
        state.request_count += 1;
        if let Some(addr) = client_addr {
            state.last_client_addr = Some(addr);
        }
        state.last_url = truncate(url, KEY_SIZE);
        if let Some(user) = user {
            state.last_user = truncate(user, KEY_SIZE);
        }
    }

    pub fn set_lb_info(&self, value: &str) {
        if let Ok(mut state) = self.state.lock() {
            state.lb_info = Some(truncate(value, KEY_SIZE));
        }
    }

    pub fn mark_delete_pending(&self) {
        if let Ok(mut state) = self.state.lock() {
            state.delete_pending += 1;
        }
    }

    pub fn is_delete_pending(&self) -> bool {
        self.state.lock().map(|s| s.delete_pending > 0).unwrap_or(false)
    }

    pub fn last_access(&self) -> Instant {
        self.state.lock().map(|s| s.last_access).unwrap_or(self.first_access)
    }

    pub fn request_count(&self) -> u64 {
        self.state.lock().map(|s| s.request_count).unwrap_or(0)
    }

    pub fn last_client_addr(&self) -> Option<IpAddr> {
        self.state.lock().ok().and_then(|s| s.last_client_addr)
    }
}

/// Keyed by session-key string (`ahash` for table performance; the key
/// itself is FNV-1a hashed only when used for consistent hashing in
/// [`super::router`] — the two hashes must not be conflated).
#[derive(Default)]
pub struct SessionTable {
    entries: AHashMap<String, Arc<Session>>,
    /// Scratch buffer for the expiry sweep's collect-then-remove pattern.
    /// Not a liveness mechanism: sessions are `Arc`-owned, so removing the
    /// table's strong reference is enough to free a session once no
    /// in-flight request still holds a clone.
    pending_free: Vec<Arc<Session>>,
}

impl SessionTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Insert a binding, returning the prior occupant of this key if any.
    pub fn insert(&mut self, session: Arc<Session>) -> Option<Arc<Session>> {
        self.entries.insert(session.key.clone(), session)
    }

    /// Look up a session by key, bumping its `last_access`.
    pub fn get(&self, key: &str) -> Option<Arc<Session>> {
        let session = self.entries.get(key).cloned();
        if let Some(ref s) = session {
            if let Ok(mut state) = s.state.lock() {
                state.last_access = Instant::now();
            }
        }
        session
    }

    pub fn remove(&mut self, key: &str) -> Option<Arc<Session>> {
        self.entries.remove(key)
    }

    /// Non-destructive listing, used by the control server's `List` snapshot.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<Session>> {
        self.entries.values()
    }

    /// Evict every entry matching `predicate`, collecting victims into
    /// `pending_free` under the lock and returning them for disposal once
    /// the caller has released it.
    pub fn evict_where(&mut self, predicate: impl Fn(&Session) -> bool) -> Vec<Arc<Session>> {
        self.pending_free.clear();
        let victims: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, s)| predicate(s.as_ref()))
            .map(|(k, _)| k.clone())
            .collect();
        for key in victims {
            if let Some(session) = self.entries.remove(&key) {
                self.pending_free.push(session);
            }
        }
        std::mem::take(&mut self.pending_free)
    }

    /// Remove every session bound to `backend` (used by `BackEnd::set_state(Kill)`).
    pub fn evict_backend(&mut self, backend: &Arc<BackEnd>) -> Vec<Arc<Session>> {
        self.evict_where(|s| Arc::ptr_eq(&s.backend, backend))
    }
}
