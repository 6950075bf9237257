use std::net::SocketAddr;
use std::sync::Arc;

use http_body_util::{BodyExt, Full};
use hyper::body::{Bytes, Incoming};
use hyper::Request;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as ConnBuilder;
use prometheus::{Histogram, HistogramOpts, IntCounter, IntGauge, Opts, Registry};
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{info, warn};

use crate::telemetry::handle_metrics;

/// Process-wide Prometheus metrics, registered once at startup.
#[derive(Clone)]
pub struct Metrics {
    pub connections_total: IntCounter,
    pub connections_active: IntGauge,
    pub connections_rejected_total: IntCounter,

    pub requests_total: IntCounter,
    pub requests_duration_seconds: Histogram,

    pub backend_requests_total: IntCounter,
    pub backend_errors_total: IntCounter,
    pub backend_duration_seconds: Histogram,
    pub backend_selections_total: IntCounter,
    pub backends_alive: IntGauge,
    pub backends_disabled: IntGauge,

    pub sessions_active: IntGauge,
    pub sessions_expired_total: IntCounter,

    pub tls_handshakes_total: IntCounter,
    pub tls_handshake_failures_total: IntCounter,
    pub tls_handshake_duration_seconds: Histogram,

    pub rate_limit_allowed_total: IntCounter,
    pub rate_limit_rejected_total: IntCounter,

    pub errors_total: IntCounter,
    pub timeouts_total: IntCounter,
}

impl Metrics {
    fn register(registry: &Registry) -> Result<Self, prometheus::Error> {
        let connections_total = register_counter(
            registry,
            "relay_connections_total",
            "Total number of connections accepted",
        )?;
        let connections_active = register_gauge(
            registry,
            "relay_connections_active",
            "Number of currently open connections",
        )?;
        let connections_rejected_total = register_counter(
            registry,
            "relay_connections_rejected_total",
            "Total number of connections rejected due to the connection limit",
        )?;

        let requests_total = register_counter(
            registry,
            "relay_requests_total",
            "Total number of HTTP requests processed",
        )?;
        let requests_duration_seconds = register_histogram(
            registry,
            "relay_requests_duration_seconds",
            "End-to-end request duration in seconds",
        )?;

        let backend_requests_total = register_counter(
            registry,
            "relay_backend_requests_total",
            "Total number of requests forwarded to a backend",
        )?;
        let backend_errors_total = register_counter(
            registry,
            "relay_backend_errors_total",
            "Total number of backend request failures",
        )?;
        let backend_duration_seconds = register_histogram(
            registry,
            "relay_backend_duration_seconds",
            "Backend request duration in seconds",
        )?;
        let backend_selections_total = register_counter(
            registry,
            "relay_backend_selections_total",
            "Total number of backend selection decisions",
        )?;
        let backends_alive = register_gauge(
            registry,
            "relay_backends_alive",
            "Number of backends currently considered alive",
        )?;
        let backends_disabled = register_gauge(
            registry,
            "relay_backends_disabled",
            "Number of backends currently disabled by the control channel",
        )?;

        let sessions_active = register_gauge(
            registry,
            "relay_sessions_active",
            "Number of session-affinity entries currently tracked",
        )?;
        let sessions_expired_total = register_counter(
            registry,
            "relay_sessions_expired_total",
            "Total number of session-affinity entries evicted by the expiry loop",
        )?;

        let tls_handshakes_total = register_counter(
            registry,
            "relay_tls_handshakes_total",
            "Total number of completed TLS handshakes",
        )?;
        let tls_handshake_failures_total = register_counter(
            registry,
            "relay_tls_handshake_failures_total",
            "Total number of failed TLS handshakes",
        )?;
        let tls_handshake_duration_seconds = register_histogram(
            registry,
            "relay_tls_handshake_duration_seconds",
            "TLS handshake duration in seconds",
        )?;

        let rate_limit_allowed_total = register_counter(
            registry,
            "relay_rate_limit_allowed_total",
            "Total number of requests allowed by rate limiting",
        )?;
        let rate_limit_rejected_total = register_counter(
            registry,
            "relay_rate_limit_rejected_total",
            "Total number of requests rejected by rate limiting",
        )?;

        let errors_total = register_counter(
            registry,
            "relay_errors_total",
            "Total number of internal errors",
        )?;
        let timeouts_total = register_counter(
            registry,
            "relay_timeouts_total",
            "Total number of connection or request timeouts",
        )?;

        Ok(Self {
            connections_total,
            connections_active,
            connections_rejected_total,
            requests_total,
            requests_duration_seconds,
            backend_requests_total,
            backend_errors_total,
            backend_duration_seconds,
            backend_selections_total,
            backends_alive,
            backends_disabled,
            sessions_active,
            sessions_expired_total,
            tls_handshakes_total,
            tls_handshake_failures_total,
            tls_handshake_duration_seconds,
            rate_limit_allowed_total,
            rate_limit_rejected_total,
            errors_total,
            timeouts_total,
        })
    }
}

fn register_counter(
    registry: &Registry,
    name: &str,
    help: &str,
) -> Result<IntCounter, prometheus::Error> {
    let counter = IntCounter::with_opts(Opts::new(name, help))?;
    registry.register(Box::new(counter.clone()))?;
    Ok(counter)
}

fn register_gauge(
    registry: &Registry,
    name: &str,
    help: &str,
) -> Result<IntGauge, prometheus::Error> {
    let gauge = IntGauge::with_opts(Opts::new(name, help))?;
    registry.register(Box::new(gauge.clone()))?;
    Ok(gauge)
}

fn register_histogram(
    registry: &Registry,
    name: &str,
    help: &str,
) -> Result<Histogram, prometheus::Error> {
    let histogram = Histogram::with_opts(HistogramOpts::new(name, help))?;
    registry.register(Box::new(histogram.clone()))?;
    Ok(histogram)
}

pub fn init_metrics() -> Result<(Arc<Metrics>, Registry), Box<dyn std::error::Error + Send + Sync>>
{
    let registry = Registry::new();
    let metrics = Arc::new(Metrics::register(&registry)?);
    Ok((metrics, registry))
}

pub async fn start_metrics_server(
    port: u16,
    registry: Registry,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let registry = Arc::new(registry);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr).await?;

    info!(?addr, "Metrics server started on dedicated port");

    let mut sigterm = signal::unix::signal(signal::unix::SignalKind::terminate())
        .map_err(|e| std::io::Error::other(format!("Failed to setup SIGTERM handler: {e}")))?;
    let mut sigint = signal::unix::signal(signal::unix::SignalKind::interrupt())
        .map_err(|e| std::io::Error::other(format!("Failed to setup SIGINT handler: {e}")))?;

    loop {
        tokio::select! {
            _ = sigterm.recv() => {
                info!("Metrics server: Received SIGTERM, shutting down");
                break;
            }
            _ = sigint.recv() => {
                info!("Metrics server: Received SIGINT, shutting down");
                break;
            }
            result = listener.accept() => {
                let (stream, peer) = match result {
                    Ok((stream, peer)) => (stream, peer),
                    Err(e) => {
                        warn!(error = %e, "Metrics server: accept error");
                        continue;
                    }
                };

                let registry = registry.clone();
                tokio::spawn(async move {
                    let svc = hyper::service::service_fn(move |req: Request<Incoming>| {
                        let registry = registry.clone();
                        async move {
                            if req.uri().path() == "/metrics" {
                                match handle_metrics(&registry) {
                                    Ok(resp) => Ok::<_, hyper::Error>(resp),
                                    Err(_) => {
                                        let body = Full::new(Bytes::from("Internal Server Error"))
                                            .map_err(|never| match never {})
                                            .boxed();
                                        let mut resp = hyper::Response::new(body);
                                        *resp.status_mut() = hyper::StatusCode::INTERNAL_SERVER_ERROR;
                                        Ok(resp)
                                    }
                                }
                            } else {
                                let body = Full::new(Bytes::from("Not Found"))
                                    .map_err(|never| match never {})
                                    .boxed();
                                let mut resp = hyper::Response::new(body);
                                *resp.status_mut() = hyper::StatusCode::NOT_FOUND;
                                Ok(resp)
                            }
                        }
                    });

                    let builder = ConnBuilder::new(TokioExecutor::new());
                    if let Err(e) = builder.serve_connection(TokioIo::new(stream), svc).await {
                        warn!(?peer, error = %e, "Metrics server: serve_connection error");
                    }
                });
            }
        }
    }

    info!("Metrics server stopped");
    Ok(())
}
