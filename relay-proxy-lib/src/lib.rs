#![forbid(unsafe_code)]

pub mod config;
pub mod core;
pub mod error;
pub mod proxy;
pub mod security;
pub mod telemetry;
pub mod tls;

pub use config::{load_from_path, Config};
pub use core::RuntimeContext;
pub use error::{ProxyError, Result};
pub use proxy::run;
