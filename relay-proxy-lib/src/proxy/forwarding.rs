use std::sync::Arc;

use http::{Request, Response, Version};
use http_body_util::{combinators::BoxBody, BodyExt};
use hyper::body::Incoming;
use tokio::time::Instant;

use crate::config::BackendHttpVersion;
use crate::core::backend::BackEnd;
use crate::proxy::client_pool::ClientPool;
use crate::proxy::http_result::{HttpError, HttpResult};
use crate::telemetry::Metrics;

pub type RespBody = BoxBody<bytes::Bytes, hyper::Error>;

/// Resolve the HTTP version to use when talking to `backend`, honoring its
/// configured preference and falling back to preserving the client's version.
pub fn determine_http_version(backend: &BackEnd, client_version: Version) -> Version {
    match backend.http_version.unwrap_or(BackendHttpVersion::Preserve) {
        BackendHttpVersion::Http11 => Version::HTTP_11,
        BackendHttpVersion::Http2 => Version::HTTP_2,
        BackendHttpVersion::Preserve => {
            if client_version == Version::HTTP_3 {
                Version::HTTP_2
            } else {
                client_version
            }
        }
    }
}

/// Forward `req` to `backend`, applying its configured connect/read/write
/// timeouts, and record request/latency metrics.
pub async fn forward(
    mut req: Request<Incoming>,
    backend: &Arc<BackEnd>,
    client_pool: &ClientPool,
    metrics: Option<Arc<Metrics>>,
) -> HttpResult<Response<RespBody>> {
    let start = Instant::now();

    let scheme = if backend.tls_client_config.is_some() { "https" } else { "http" };
    let uri = format!(
        "{scheme}://{}{}",
        backend.address,
        req.uri().path_and_query().map(|pq| pq.as_str()).unwrap_or("/")
    )
    .parse::<http::Uri>()
    .map_err(|e| HttpError::InvalidUri(e.to_string()))?;

    let client_version = req.version();
    let target_version = determine_http_version(backend, client_version);
    if req.version() != target_version {
        *req.version_mut() = target_version;
    }

    let (mut parts, body) = req.into_parts();
    parts.uri = uri;
    let out_req = Request::from_parts(parts, body);

    let client = client_pool.client_for(backend, target_version);
    let call = client.request(out_req);
    let result = tokio::time::timeout(backend.read_timeout, call).await;

    let duration = start.elapsed().as_secs_f64();

    match result {
        Ok(Ok(resp)) => {
            if let Some(ref m) = metrics {
                m.backend_requests_total.inc();
                m.backend_duration_seconds.observe(duration);
            }
            Ok(resp.map(|b| b.boxed()))
        }
        Ok(Err(e)) => {
            if let Some(ref m) = metrics {
                m.backend_errors_total.inc();
            }
            Err(HttpError::FailedToGetResponseFromBackend(e.to_string()))
        }
        Err(_elapsed) => {
            if let Some(ref m) = metrics {
                m.backend_errors_total.inc();
                m.timeouts_total.inc();
            }
            Err(HttpError::Timeout)
        }
    }
}
