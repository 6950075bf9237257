use std::sync::Arc;
use std::time::Duration;

use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as ConnBuilder;
use tokio::net::TcpStream;
use tokio::time::Instant;
use tokio_rustls::TlsAcceptor;
use tracing::warn;

use super::dispatch;
use super::timeout_helper::serve_with_timeout;
use crate::proxy::context::RequestContext;
use crate::telemetry::Metrics;
use crate::tls::record_tls_handshake_metrics;

/// Configuration for handling TLS connections.
pub struct TlsConnectionConfig {
    pub acceptor: TlsAcceptor,
    pub handshake_timeout: Duration,
    pub connection_handling_timeout: Option<Duration>,
}

/// Handle a TLS connection: performs the handshake (bounded by
/// `handshake_timeout`), records handshake metrics, then drives the hyper
/// service loop over the decrypted stream exactly like a plain connection.
pub async fn handle_tls_connection(
    stream: TcpStream,
    ctx: Arc<RequestContext>,
    builder: ConnBuilder<TokioExecutor>,
    config: TlsConnectionConfig,
) {
    let peer = ctx.peer;
    let metrics = ctx.metrics.clone();

    let handshake_start = Instant::now();
    let accepted = tokio::time::timeout(config.handshake_timeout, config.acceptor.accept(stream)).await;

    let tls = match accepted {
        Ok(Ok(tls)) => tls,
        Ok(Err(e)) => {
            warn!(?peer, error = %e, "tls handshake failed");
            record_handshake_failure(metrics.as_ref());
            return;
        }
        Err(_) => {
            warn!(?peer, "tls handshake timed out");
            record_handshake_failure(metrics.as_ref());
            return;
        }
    };

    let handshake_duration = handshake_start.elapsed().as_secs_f64();
    record_tls_handshake_metrics(&tls, handshake_duration, metrics.clone());

    let svc = hyper::service::service_fn(move |req| {
        let ctx = ctx.clone();
        async move { Ok::<_, hyper::Error>(dispatch(req, ctx).await) }
    });

    let serve_fut = builder.serve_connection(TokioIo::new(tls), svc);
    serve_with_timeout(serve_fut, config.connection_handling_timeout, metrics, peer).await;
}

fn record_handshake_failure(metrics: Option<&Arc<Metrics>>) {
    if let Some(m) = metrics {
        m.tls_handshake_failures_total.inc();
    }
}
