use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as ConnBuilder;
use tokio::net::{TcpListener, TcpStream};
use tokio::signal;
use tokio::sync::watch;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::core::{control, expire, health, rescale, Listener, RuntimeContext};
use crate::error::Result;
use crate::proxy::client_pool::ClientPool;
use crate::proxy::connection::{ConnectionError, ConnectionManager};
use crate::proxy::context::{RequestContext, SecurityContext};
use crate::proxy::transport::{
    handle_plain_connection, handle_tls_connection, PlainConnectionConfig, TlsConnectionConfig,
};
use crate::security::RateLimitManager;
use crate::telemetry::Metrics;

/// Runs the proxy until a shutdown signal arrives: binds every configured
/// listener, spawns the background maintenance loops (health, expiry,
/// rescale) and, if configured, the control socket, then blocks accepting
/// connections on every listener concurrently.
pub async fn run(config: Config, metrics: Option<Arc<Metrics>>) -> Result<()> {
    let runtime = Arc::new(RuntimeContext::from_config(&config).await?);
    let client_pool = Arc::new(ClientPool::new(&config.timeout.keep_alive));

    let rate_limit_manager = if config.security.rate_limit.enabled {
        let services = all_service_configs(&config);
        Some(Arc::new(RateLimitManager::new(&config.security.rate_limit, &services)))
    } else {
        None
    };
    let security = SecurityContext::new(
        config.security.headers.clone(),
        config.security.ip_filter.clone(),
        config.security.rate_limit.clone(),
        rate_limit_manager,
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let shutdown_flag = Arc::new(AtomicUsize::new(0));
    let (connections_closed_tx, mut connections_closed_rx) = watch::channel(());
    let connection_manager =
        Arc::new(ConnectionManager::new(&config.security, shutdown_flag.clone(), connections_closed_tx));

    spawn_maintenance_loops(&runtime, &config, shutdown_rx.clone());
    spawn_key_rotation_loops(&runtime, shutdown_rx.clone());

    if let Some(socket_path) = config.control.socket_path.clone() {
        let ctx = runtime.clone();
        let shutdown = shutdown_rx.clone();
        tokio::spawn(async move {
            if let Err(e) = control::run_control_server(socket_path, ctx, shutdown).await {
                error!(error = %e, "control server exited");
            }
        });
    }

    let mut accept_handles = Vec::with_capacity(runtime.listeners.len());
    for listener in &runtime.listeners {
        let tcp = TcpListener::bind(listener.address).await?;
        info!(address = %listener.address, https = listener.is_https(), "listener bound");

        let handle = tokio::spawn(accept_loop(
            tcp,
            listener.clone(),
            runtime.clone(),
            client_pool.clone(),
            security.clone(),
            metrics.clone(),
            connection_manager.clone(),
            config.timeout.connection_handling_secs,
            config.timeout.tls_handshake_secs,
            config.timeout.keep_alive.enabled,
            shutdown_rx.clone(),
        ));
        accept_handles.push(handle);
    }

    wait_for_shutdown_signal().await;
    info!("shutdown signal received, draining connections");
    shutdown_flag.store(1, Ordering::Relaxed);
    let _ = shutdown_tx.send(true);

    let shutdown_timeout = Duration::from_secs(config.timeout.shutdown_secs);
    let drained = tokio::time::timeout(shutdown_timeout, async {
        while connection_manager.active_connections().load(Ordering::Relaxed) > 0 {
            if connections_closed_rx.changed().await.is_err() {
                break;
            }
        }
    })
    .await;
    if drained.is_err() {
        warn!("graceful shutdown timed out with connections still open");
    }

    for handle in accept_handles {
        handle.abort();
    }

    Ok(())
}

fn all_service_configs(config: &Config) -> Vec<crate::config::ServiceConfig> {
    let mut services: Vec<crate::config::ServiceConfig> =
        config.listener.iter().flat_map(|l| l.service.iter().cloned()).collect();
    services.extend(config.service.iter().cloned());
    services
}

fn spawn_maintenance_loops(
    runtime: &Arc<RuntimeContext>,
    config: &Config,
    shutdown: watch::Receiver<bool>,
) {
    let services = Arc::new(runtime.all_services());
    let maintenance = config.maintenance.clone();

    let health_services = services.clone();
    let health_shutdown = shutdown.clone();
    tokio::spawn(async move {
        health::run_health_loop(
            health_services,
            Duration::from_secs(maintenance.alive_secs),
            Duration::from_secs(maintenance.health_connect_secs),
            health_shutdown,
        )
        .await;
    });

    let expire_services = services.clone();
    let expire_shutdown = shutdown.clone();
    let expire_secs = config.maintenance.expire_secs;
    tokio::spawn(async move {
        expire::run_expiry_loop(expire_services, Duration::from_secs(expire_secs), expire_shutdown).await;
    });

    let rescale_services = services;
    let rescale_secs = config.maintenance.rescale_secs;
    tokio::spawn(async move {
        rescale::run_rescale_loop(rescale_services, Duration::from_secs(rescale_secs), shutdown).await;
    });
}

/// Spawns one session-ticket key rotation loop per TLS-terminating listener,
/// each running on that listener's own `key_rotation_secs` interval.
fn spawn_key_rotation_loops(runtime: &Arc<RuntimeContext>, shutdown: watch::Receiver<bool>) {
    for listener in &runtime.listeners {
        let Some(tls) = listener.tls.as_ref() else { continue };
        let interval = tls.key_rotation_interval();
        let listener = listener.clone();
        let mut shutdown = shutdown.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.tick().await; // first tick fires immediately; skip it
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        if let Some(tls) = listener.tls.as_ref() {
                            tls.rotate_ticket_key();
                        }
                    }
                    _ = shutdown.changed() => {
                        if *shutdown.borrow() {
                            break;
                        }
                    }
                }
            }
        });
    }
}

/// One listener's accept loop: admits connections through the
/// `ConnectionManager`, then dispatches each to the plain or TLS transport
/// depending on whether the listener carries a TLS configuration.
#[allow(clippy::too_many_arguments)]
async fn accept_loop(
    tcp: TcpListener,
    listener: Arc<Listener>,
    runtime: Arc<RuntimeContext>,
    client_pool: Arc<ClientPool>,
    security: SecurityContext,
    metrics: Option<Arc<Metrics>>,
    connection_manager: Arc<ConnectionManager>,
    connection_handling_secs: u64,
    tls_handshake_secs: u64,
    keep_alive_enabled: bool,
    mut shutdown: watch::Receiver<bool>,
) {
    let connection_handling_timeout =
        (connection_handling_secs > 0).then(|| Duration::from_secs(connection_handling_secs));
    let handshake_timeout = Duration::from_secs(tls_handshake_secs);

    loop {
        let (stream, peer) = tokio::select! {
            result = tcp.accept() => {
                match result {
                    Ok(v) => v,
                    Err(e) => {
                        warn!(address = %listener.address, error = %e, "accept error");
                        continue;
                    }
                }
            }
            _ = shutdown.changed() => {
                if *shutdown.borrow() {
                    break;
                }
                continue;
            }
        };

        if listener.is_disabled() {
            continue;
        }

        let guard = match connection_manager.try_accept(peer, metrics.as_ref()) {
            Ok(guard) => guard,
            Err(ConnectionError::Shutdown) => break,
            Err(ConnectionError::LimitExceeded { .. }) => continue,
        };

        let ctx = Arc::new(RequestContext {
            runtime: runtime.clone(),
            listener: listener.clone(),
            client_pool: client_pool.clone(),
            security: security.clone(),
            metrics: metrics.clone(),
            peer,
            is_https: listener.is_https(),
        });

        let mut builder = ConnBuilder::new(TokioExecutor::new());
        builder.http1().keep_alive(keep_alive_enabled);
        let tls = listener.tls.as_ref().map(|t| t.acceptor());

        tokio::spawn(async move {
            let _guard = guard;
            serve_connection(stream, ctx, builder, tls, connection_handling_timeout, handshake_timeout)
                .await;
        });
    }
}

async fn serve_connection(
    stream: TcpStream,
    ctx: Arc<RequestContext>,
    builder: ConnBuilder<TokioExecutor>,
    tls: Option<tokio_rustls::TlsAcceptor>,
    connection_handling_timeout: Option<Duration>,
    handshake_timeout: Duration,
) {
    match tls {
        Some(acceptor) => {
            handle_tls_connection(
                stream,
                ctx,
                builder,
                TlsConnectionConfig { acceptor, handshake_timeout, connection_handling_timeout },
            )
            .await;
        }
        None => {
            handle_plain_connection(stream, ctx, builder, PlainConnectionConfig {
                connection_handling_timeout,
            })
            .await;
        }
    }
}

async fn wait_for_shutdown_signal() {
    let ctrl_c = signal::ctrl_c();
    let mut sigterm = match signal::unix::signal(signal::unix::SignalKind::terminate()) {
        Ok(s) => s,
        Err(e) => {
            warn!(error = %e, "failed to install SIGTERM handler, waiting on SIGINT only");
            let _ = ctrl_c.await;
            return;
        }
    };

    tokio::select! {
        _ = ctrl_c => info!("received SIGINT"),
        _ = sigterm.recv() => info!("received SIGTERM"),
    }
}
