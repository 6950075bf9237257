use std::sync::Arc;

use http::header::HOST;
use http::Response;
use hyper::body::Incoming;
use hyper::Request;
use tokio::time::Instant;

use crate::config::RewriteLocation;
use crate::core::backend::{BackEnd, BackendKind};
use crate::core::rewrite::{self, RewriteDecision};
use crate::core::service::Service;
use crate::proxy::context::RequestContext;
use crate::proxy::forwarding::{forward, RespBody};
use crate::proxy::handler::header_manipulation::{
    apply_request_header_manipulation, apply_response_header_manipulation,
};
use crate::proxy::handler::headers::{add_forwarded_headers, extract_basic_auth_user};
use crate::proxy::handler::rate_limit_validation::check_rate_limit;
use crate::proxy::http_result::{HttpError, HttpResult};
use crate::proxy::synthetic_response::synthetic_redirect_response;
use crate::security::{apply_security_headers, is_ip_allowed};

const LOCATION_HEADERS: [&str; 3] = ["location", "content-location", "destination"];

/// Drives one request end to end: service/back-end selection, header
/// manipulation, forwarding, and response post-processing (location
/// rewrite, security headers, session affinity bookkeeping).
pub async fn handle_proxy_request(
    mut req: Request<Incoming>,
    ctx: Arc<RequestContext>,
) -> HttpResult<Response<RespBody>> {
    let start = Instant::now();
    if let Some(m) = &ctx.metrics {
        m.requests_total.inc();
    }

    if !is_ip_allowed(ctx.peer.ip(), &ctx.security.ip_filter) {
        return Err(HttpError::Forbidden);
    }

    add_forwarded_headers(&mut req, ctx.peer, ctx.is_https);

    let target = req
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or_else(|| req.uri().path())
        .to_string();

    let service = ctx
        .runtime
        .router
        .get_service(&ctx.listener, &ctx.runtime.global_services, &target, req.headers())
        .ok_or(HttpError::NoMatchingBackend)?;

    if let Some(resp) = check_rate_limit(
        ctx.security.rate_limit_manager.as_ref(),
        &ctx.security.rate_limit_config,
        &service,
        ctx.peer,
        req.headers(),
        ctx.metrics.as_ref(),
    ) {
        return Ok(resp);
    }

    let user = extract_basic_auth_user(req.headers());
    let host_header = req.headers().get(HOST).and_then(|v| v.to_str().ok()).map(str::to_string);

    let (parts, body) = req.into_parts();
    let outcome = ctx.runtime.router.get_backend(&service, ctx.peer, &parts, user.as_deref());
    let request_parts = parts.clone();
    let mut req = Request::from_parts(parts, body);

    if let Some(m) = &ctx.metrics {
        m.backend_selections_total.inc();
    }

    let Some(backend) = outcome.backend else {
        return Err(HttpError::NoUpstreamCandidates);
    };

    apply_request_header_manipulation(req.headers_mut(), None, service.headers.as_ref());

    let mut response = if let BackendKind::Redirect { .. } = &backend.kind {
        let request_path = req.uri().path().to_string();
        let captures = service.url.first().and_then(|m| m.captures(&request_path));
        synthetic_redirect_response(&backend, &request_path, captures.as_ref())
            .map_err(|e| HttpError::FailedToGenerateDownstreamResponse(e.to_string()))?
    } else {
        forward(req, &backend, &ctx.client_pool, ctx.metrics.clone()).await?
    };

    let elapsed = start.elapsed();
    ctx.runtime.updater.update_backend_stats(&backend, elapsed, response.status());

    apply_response_header_manipulation(response.headers_mut(), None, service.headers.as_ref());

    rewrite_location_headers(&mut response, &ctx, &backend, &service, host_header.as_deref()).await;

    ctx.runtime.updater.update_session(
        &service,
        ctx.peer,
        &request_parts,
        response.status(),
        response.headers(),
        user.as_deref(),
        &backend,
        outcome.session.as_ref(),
        outcome.session_key.as_deref(),
    );

    apply_security_headers(&mut response, Some(&ctx.security.headers), ctx.is_https);

    if let Some(m) = &ctx.metrics {
        m.requests_duration_seconds.observe(elapsed.as_secs_f64());
    }

    Ok(response)
}

async fn rewrite_location_headers(
    response: &mut Response<RespBody>,
    ctx: &RequestContext,
    backend: &BackEnd,
    service: &Service,
    host: Option<&str>,
) {
    let mode = ctx.listener.rewrite_location;
    if mode == RewriteLocation::Off {
        return;
    }

    for header_name in LOCATION_HEADERS {
        let Some(value) = response.headers().get(header_name) else { continue };
        let Ok(value) = value.to_str() else { continue };
        let value = value.to_string();

        let decision = rewrite::decide(
            mode,
            &value,
            &ctx.listener,
            &ctx.runtime.listeners,
            backend,
            service,
            host,
        )
        .await;
        if decision == RewriteDecision::No {
            continue;
        }
        let rewritten = rewrite::apply(decision, &value, host);
        if let Ok(header_value) = http::HeaderValue::from_str(&rewritten) {
            response.headers_mut().insert(
                http::HeaderName::from_bytes(header_name.as_bytes()).expect("static header name"),
                header_value,
            );
        }
    }
}
