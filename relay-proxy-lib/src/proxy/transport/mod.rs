mod timeout_helper;

pub mod plain;
pub mod tls;

pub use plain::{handle_plain_connection, PlainConnectionConfig};
pub use tls::{handle_tls_connection, TlsConnectionConfig};

use std::sync::Arc;

use http::StatusCode;
use http_body_util::BodyExt;
use hyper::body::Incoming;
use hyper::{Request, Response};
use tracing::error;

use crate::proxy::context::RequestContext;
use crate::proxy::forwarding::RespBody;
use crate::proxy::handler::handle_proxy_request;
use crate::proxy::synthetic_response::synthetic_error_response;

/// Drives one request through `handle_proxy_request`, turning any
/// dispatch-time error into a synthetic error response instead of tearing
/// down the connection.
async fn dispatch(req: Request<Incoming>, ctx: Arc<RequestContext>) -> Response<RespBody> {
    let metrics = ctx.metrics.clone();
    match handle_proxy_request(req, ctx).await {
        Ok(resp) => resp,
        Err(e) => {
            error!(error = %e, "request handling failed");
            if let Some(m) = &metrics {
                m.errors_total.inc();
            }
            let status = StatusCode::from(e);
            synthetic_error_response(status).unwrap_or_else(|_| {
                let body = http_body_util::Full::new(bytes::Bytes::from_static(b"internal error"))
                    .map_err(|never| match never {})
                    .boxed();
                let mut resp = Response::new(body);
                *resp.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
                resp
            })
        }
    }
}
