pub mod headers;
pub mod ip_filter;
pub mod rate_limit;

pub use headers::apply_security_headers;
pub use ip_filter::is_ip_allowed;
pub use rate_limit::{extract_rate_limit_key, RateLimitResult, RateLimitManager, RateLimiter};
