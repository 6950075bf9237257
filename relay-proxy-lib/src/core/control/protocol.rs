use serde::{Deserialize, Serialize};

/// A command sent over the control socket. Ordinals index into the
/// declaration-order `Vec`s built at configuration load, mirroring the
/// original's `sel_lstn`/`sel_svc`/`sel_be` selectors.
///
/// Top-level (`global: true`) services live outside any listener's `Vec`, in
/// `RuntimeContext::global_services`, so they get their own parallel set of
/// commands addressed by a bare service ordinal rather than `{listener,
/// service}`.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum Command {
    List,
    EnableListener { listener: usize },
    DisableListener { listener: usize },
    EnableService { listener: usize, service: usize },
    DisableService { listener: usize, service: usize },
    EnableBackend { listener: usize, service: usize, backend: usize },
    DisableBackend { listener: usize, service: usize, backend: usize },
    AddSession { listener: usize, service: usize, key: String, backend: usize },
    DeleteSession { listener: usize, service: usize, key: String },
    EnableGlobalService { service: usize },
    DisableGlobalService { service: usize },
    EnableGlobalBackend { service: usize, backend: usize },
    DisableGlobalBackend { service: usize, backend: usize },
    AddGlobalSession { service: usize, key: String, backend: usize },
    DeleteGlobalSession { service: usize, key: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendSnapshot {
    pub address: String,
    pub alive: bool,
    pub disabled: bool,
    pub priority: i64,
    pub request_count: u64,
}

/// One session-table entry, shaped so an operator can read a key straight
/// off a `List` snapshot and pass it to `DeleteSession`/`DeleteGlobalSession`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub key: String,
    /// Ordinal into the owning service's `backends`.
    pub backend: usize,
    pub request_count: u64,
    /// Variable-length last-seen client address, absent if never recorded.
    pub last_ip: Option<String>,
    pub delete_pending: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceSnapshot {
    pub name: String,
    pub disabled: bool,
    pub tot_pri: i64,
    pub abs_pri: i64,
    pub sessions: Vec<SessionSnapshot>,
    pub backends: Vec<BackendSnapshot>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListenerSnapshot {
    pub address: String,
    pub disabled: bool,
    pub services: Vec<ServiceSnapshot>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub listeners: Vec<ListenerSnapshot>,
    pub global_services: Vec<ServiceSnapshot>,
}

/// A response frame: either a snapshot, a plain acknowledgement, or an error.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Response {
    Ok,
    Snapshot(Snapshot),
    Error { message: String },
}
