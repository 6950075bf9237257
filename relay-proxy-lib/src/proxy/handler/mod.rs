pub mod header_manipulation;
pub mod headers;
pub mod rate_limit_validation;
pub mod request;

pub use header_manipulation::{apply_request_header_manipulation, apply_response_header_manipulation};
pub use headers::{add_forwarded_headers, extract_basic_auth_user};
pub use rate_limit_validation::check_rate_limit;
pub use request::handle_proxy_request;
