use std::sync::Arc;
use std::time::Duration;

use hyper::body::Incoming;
use hyper::Request;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as ConnBuilder;
use tokio::net::TcpStream;

use super::dispatch;
use super::timeout_helper::serve_with_timeout;
use crate::proxy::context::RequestContext;

/// Configuration for handling plain HTTP connections.
pub struct PlainConnectionConfig {
    pub connection_handling_timeout: Option<Duration>,
}

/// Handle a plain HTTP connection: drives the hyper service loop, dispatching
/// every request on it to `handle_proxy_request` through `dispatch`.
pub async fn handle_plain_connection(
    stream: TcpStream,
    ctx: Arc<RequestContext>,
    builder: ConnBuilder<TokioExecutor>,
    config: PlainConnectionConfig,
) {
    let peer = ctx.peer;
    let metrics = ctx.metrics.clone();

    let svc = hyper::service::service_fn(move |req: Request<Incoming>| {
        let ctx = ctx.clone();
        async move { Ok::<_, hyper::Error>(dispatch(req, ctx).await) }
    });

    let serve_fut = builder.serve_connection(TokioIo::new(stream), svc);
    serve_with_timeout(serve_fut, config.connection_handling_timeout, metrics, peer).await;
}
