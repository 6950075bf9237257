use http::StatusCode;
use thiserror::Error;

/// HTTP result type, T is typically a hyper::Response
/// HttpError is used to generate a synthetic error response
pub(crate) type HttpResult<T> = std::result::Result<T, HttpError>;

/// Describes things that can go wrong in the forwarder
#[derive(Debug, Error, Clone)]
pub enum HttpError {
    #[error("Invalid host in request header")]
    InvalidHostInRequestHeader,

    #[error("request did not match any service")]
    NoMatchingBackend,

    #[error("service matched but has no routable backend")]
    NoUpstreamCandidates,

    #[error("Failed to generate upstream request for backend: {0}")]
    FailedToGenerateUpstreamRequest(String),

    #[error("Failed to get response from backend: {0}")]
    FailedToGetResponseFromBackend(String),

    #[error("Failed to generate downstream response: {0}")]
    FailedToGenerateDownstreamResponse(String),

    #[error("Invalid URI: {0}")]
    InvalidUri(String),

    #[error("Backend error: {0}")]
    BackendError(String),

    #[error("request rejected by IP filter")]
    Forbidden,

    #[error("connection or request timed out")]
    Timeout,
}

impl From<HttpError> for StatusCode {
    fn from(e: HttpError) -> StatusCode {
        match e {
            HttpError::InvalidHostInRequestHeader => StatusCode::BAD_REQUEST,
            HttpError::NoMatchingBackend => StatusCode::NOT_FOUND,
            HttpError::NoUpstreamCandidates => StatusCode::SERVICE_UNAVAILABLE,
            HttpError::FailedToGenerateUpstreamRequest(_) => StatusCode::INTERNAL_SERVER_ERROR,
            HttpError::FailedToGetResponseFromBackend(_) => StatusCode::BAD_GATEWAY,
            HttpError::FailedToGenerateDownstreamResponse(_) => StatusCode::INTERNAL_SERVER_ERROR,
            HttpError::InvalidUri(_) => StatusCode::BAD_REQUEST,
            HttpError::BackendError(_) => StatusCode::BAD_GATEWAY,
            HttpError::Forbidden => StatusCode::FORBIDDEN,
            HttpError::Timeout => StatusCode::GATEWAY_TIMEOUT,
        }
    }
}

impl HttpError {
    pub fn error_type(&self) -> &'static str {
        match self {
            HttpError::InvalidHostInRequestHeader => "invalid_host",
            HttpError::NoMatchingBackend => "no_matching_service",
            HttpError::NoUpstreamCandidates => "no_upstream_candidates",
            HttpError::FailedToGenerateUpstreamRequest(_) => "upstream_request_build_failed",
            HttpError::FailedToGetResponseFromBackend(_) => "backend_request_failed",
            HttpError::FailedToGenerateDownstreamResponse(_) => "downstream_response_build_failed",
            HttpError::InvalidUri(_) => "invalid_uri",
            HttpError::BackendError(_) => "backend_error",
            HttpError::Forbidden => "forbidden",
            HttpError::Timeout => "timeout",
        }
    }
}
