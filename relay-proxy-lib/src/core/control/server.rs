use std::sync::atomic::Ordering;
use std::sync::Arc;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{UnixListener, UnixStream};
use tracing::{info, warn};

use crate::core::backend::BackendStateChange;
use crate::core::context::RuntimeContext;
use crate::core::session::Session;

use super::protocol::{
    BackendSnapshot, Command, ListenerSnapshot, Response, ServiceSnapshot, Snapshot, SessionSnapshot,
};

/// Runs the control server's accept loop until `shutdown` fires. One
/// connection handles exactly one command, matching the original's
/// one-shot-per-connection protocol.
pub async fn run_control_server(
    socket_path: String,
    ctx: Arc<RuntimeContext>,
    mut shutdown: tokio::sync::watch::Receiver<bool>,
) -> std::io::Result<()> {
    let _ = std::fs::remove_file(&socket_path);
    let listener = UnixListener::bind(&socket_path)?;
    info!(path = %socket_path, "control server listening");

    loop {
        tokio::select! {
            accepted = listener.accept() => {
                let (stream, _) = match accepted {
                    Ok(pair) => pair,
                    Err(e) => {
                        warn!(error = %e, "control server accept error");
                        continue;
                    }
                };
                let ctx = ctx.clone();
                tokio::spawn(async move {
                    if let Err(e) = handle_connection(stream, &ctx).await {
                        warn!(error = %e, "control connection error");
                    }
                });
            }
            _ = shutdown.changed() => {
                if *shutdown.borrow() {
                    let _ = std::fs::remove_file(&socket_path);
                    break;
                }
            }
        }
    }
    Ok(())
}

async fn handle_connection(mut stream: UnixStream, ctx: &RuntimeContext) -> std::io::Result<()> {
    let mut len_buf = [0u8; 4];
    stream.read_exact(&mut len_buf).await?;
    let len = u32::from_be_bytes(len_buf) as usize;

    let mut body = vec![0u8; len];
    stream.read_exact(&mut body).await?;

    let response = match serde_json::from_slice::<Command>(&body) {
        Ok(command) => dispatch(ctx, command),
        Err(e) => Response::Error { message: format!("malformed command: {e}") },
    };

    let encoded = serde_json::to_vec(&response).unwrap_or_else(|_| b"{}".to_vec());
    stream.write_all(&(encoded.len() as u32).to_be_bytes()).await?;
    stream.write_all(&encoded).await?;
    stream.flush().await
}

fn dispatch(ctx: &RuntimeContext, command: Command) -> Response {
    match command {
        Command::List => Response::Snapshot(build_snapshot(ctx)),
        Command::EnableListener { listener } => with_listener(ctx, listener, |l| {
            l.set_disabled(false);
            Response::Ok
        }),
        Command::DisableListener { listener } => with_listener(ctx, listener, |l| {
            l.set_disabled(true);
            Response::Ok
        }),
        Command::EnableService { listener, service } => with_service(ctx, listener, service, |s| {
            s.set_disabled(false);
            Response::Ok
        }),
        Command::DisableService { listener, service } => with_service(ctx, listener, service, |s| {
            s.set_disabled(true);
            Response::Ok
        }),
        Command::EnableBackend { listener, service, backend } => {
            with_backend(ctx, listener, service, backend, BackendStateChange::Enable)
        }
        Command::DisableBackend { listener, service, backend } => {
            with_backend(ctx, listener, service, backend, BackendStateChange::Disable)
        }
        Command::AddSession { listener, service, key, backend } => {
            with_service(ctx, listener, service, |s| {
                let Some(be) = s.backends.get(backend) else {
                    return Response::Error { message: "unknown backend ordinal".into() };
                };
                let session = Arc::new(Session::new(key, be.clone(), None));
                match s.session_table.lock() {
                    Ok(mut table) => {
                        table.insert(session);
                        Response::Ok
                    }
                    Err(_) => Response::Error { message: "session table lock poisoned".into() },
                }
            })
        }
        Command::DeleteSession { listener, service, key } => {
            with_service(ctx, listener, service, |s| match s.session_table.lock() {
                Ok(mut table) => {
                    table.remove(&key);
                    Response::Ok
                }
                Err(_) => Response::Error { message: "session table lock poisoned".into() },
            })
        }
        Command::EnableGlobalService { service } => with_global_service(ctx, service, |s| {
            s.set_disabled(false);
            Response::Ok
        }),
        Command::DisableGlobalService { service } => with_global_service(ctx, service, |s| {
            s.set_disabled(true);
            Response::Ok
        }),
        Command::EnableGlobalBackend { service, backend } => {
            with_global_backend(ctx, service, backend, BackendStateChange::Enable)
        }
        Command::DisableGlobalBackend { service, backend } => {
            with_global_backend(ctx, service, backend, BackendStateChange::Disable)
        }
        Command::AddGlobalSession { service, key, backend } => {
            with_global_service(ctx, service, |s| {
                let Some(be) = s.backends.get(backend) else {
                    return Response::Error { message: "unknown backend ordinal".into() };
                };
                let session = Arc::new(Session::new(key, be.clone(), None));
                match s.session_table.lock() {
                    Ok(mut table) => {
                        table.insert(session);
                        Response::Ok
                    }
                    Err(_) => Response::Error { message: "session table lock poisoned".into() },
                }
            })
        }
        Command::DeleteGlobalSession { service, key } => {
            with_global_service(ctx, service, |s| match s.session_table.lock() {
                Ok(mut table) => {
                    table.remove(&key);
                    Response::Ok
                }
                Err(_) => Response::Error { message: "session table lock poisoned".into() },
            })
        }
    }
}

fn with_listener(
    ctx: &RuntimeContext,
    index: usize,
    f: impl FnOnce(&crate::core::listener::Listener) -> Response,
) -> Response {
    match ctx.listeners.get(index) {
        Some(listener) => f(listener),
        None => Response::Error { message: "unknown listener ordinal".into() },
    }
}

fn with_service(
    ctx: &RuntimeContext,
    listener: usize,
    service: usize,
    f: impl FnOnce(&crate::core::service::Service) -> Response,
) -> Response {
    with_listener(ctx, listener, |l| match l.services.get(service) {
        Some(service) => f(service),
        None => Response::Error { message: "unknown service ordinal".into() },
    })
}

fn with_backend(
    ctx: &RuntimeContext,
    listener: usize,
    service: usize,
    backend: usize,
    mode: BackendStateChange,
) -> Response {
    with_service(ctx, listener, service, |s| match s.backends.get(backend) {
        Some(be) => {
            s.set_backend_state(be, mode);
            Response::Ok
        }
        None => Response::Error { message: "unknown backend ordinal".into() },
    })
}

fn with_global_service(
    ctx: &RuntimeContext,
    service: usize,
    f: impl FnOnce(&crate::core::service::Service) -> Response,
) -> Response {
    match ctx.global_services.get(service) {
        Some(service) => f(service),
        None => Response::Error { message: "unknown global service ordinal".into() },
    }
}

fn with_global_backend(
    ctx: &RuntimeContext,
    service: usize,
    backend: usize,
    mode: BackendStateChange,
) -> Response {
    with_global_service(ctx, service, |s| match s.backends.get(backend) {
        Some(be) => {
            s.set_backend_state(be, mode);
            Response::Ok
        }
        None => Response::Error { message: "unknown backend ordinal".into() },
    })
}

fn build_snapshot(ctx: &RuntimeContext) -> Snapshot {
    let listeners = ctx
        .listeners
        .iter()
        .map(|l| ListenerSnapshot {
            address: l.address.to_string(),
            disabled: l.is_disabled(),
            services: l.services.iter().map(service_snapshot).collect(),
        })
        .collect();
    let global_services = ctx.global_services.iter().map(service_snapshot).collect();
    Snapshot { listeners, global_services }
}

fn service_snapshot(service: &Arc<crate::core::service::Service>) -> ServiceSnapshot {
    let sessions = match service.session_table.lock() {
        Ok(table) => table
            .iter()
            .map(|session| SessionSnapshot {
                key: session.key.clone(),
                backend: service
                    .backends
                    .iter()
                    .position(|b| Arc::ptr_eq(b, &session.backend))
                    .unwrap_or(usize::MAX),
                request_count: session.request_count(),
                last_ip: session.last_client_addr().map(|ip| ip.to_string()),
                delete_pending: session.is_delete_pending(),
            })
            .collect(),
        Err(_) => Vec::new(),
    };
    ServiceSnapshot {
        name: service.name.clone(),
        disabled: service.is_disabled(),
        tot_pri: service.tot_pri.load(Ordering::Acquire),
        abs_pri: service.abs_pri.load(Ordering::Acquire),
        sessions,
        backends: service
            .backends
            .iter()
            .map(|b| BackendSnapshot {
                address: b.address.to_string(),
                alive: b.is_alive(),
                disabled: b.is_disabled(),
                priority: b.priority(),
                request_count: b.counters.lock().map(|c| c.n_requests).unwrap_or(0),
            })
            .collect(),
    }
}
