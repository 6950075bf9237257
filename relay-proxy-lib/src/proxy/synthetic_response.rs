use crate::core::backend::{BackendKind, BackEnd};
use crate::config::RedirectMode;
use crate::error::{ProxyError, Result};
use http::StatusCode;
use http_body_util::{combinators::BoxBody, BodyExt, Full};
use hyper::body::Bytes;
use hyper::Response;

type RespBody = BoxBody<Bytes, hyper::Error>;

/// Build HTTP response with status code of 4xx and 5xx
pub(crate) fn synthetic_error_response(status_code: StatusCode) -> Result<Response<RespBody>> {
    let res = Response::builder()
        .status(status_code)
        .body(empty_body())
        .map_err(|e| ProxyError::Http(format!("Failed to build error response: {e}")))?;
    Ok(res)
}

/// Build the `Location`-bearing redirect response for a `BackendKind::Redirect` back-end.
pub(crate) fn synthetic_redirect_response(
    backend: &BackEnd,
    request_path: &str,
    captures: Option<&regex::Captures<'_>>,
) -> Result<Response<RespBody>> {
    let BackendKind::Redirect { status, target, mode } = &backend.kind else {
        return Err(ProxyError::Http("redirect response requested for a non-redirect backend".into()));
    };

    let location = match mode {
        RedirectMode::Static => target.clone(),
        RedirectMode::AppendPath => format!("{target}{request_path}"),
        RedirectMode::DynamicSubstitution => {
            let Some(captures) = captures else { return Ok(synthetic_error_response(StatusCode::INTERNAL_SERVER_ERROR)?) };
            substitute_captures(target, captures)
        }
    };

    let res = Response::builder()
        .status(*status)
        .header(http::header::LOCATION, location)
        .body(empty_body())
        .map_err(|e| ProxyError::Http(format!("Failed to build redirect response: {e}")))?;
    Ok(res)
}

fn substitute_captures(template: &str, captures: &regex::Captures<'_>) -> String {
    let mut out = String::with_capacity(template.len());
    let mut chars = template.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        if c == '$' {
            if let Some((_, next)) = chars.peek().copied() {
                if next.is_ascii_digit() {
                    chars.next();
                    let idx = next.to_digit(10).unwrap() as usize;
                    if let Some(m) = captures.get(idx) {
                        out.push_str(m.as_str());
                    }
                    continue;
                }
            }
            out.push(c);
        } else {
            out.push(c);
            let _ = i;
        }
    }
    out
}

fn empty_body() -> RespBody {
    Full::new(Bytes::new())
        .map_err(|never| match never {})
        .boxed()
}
