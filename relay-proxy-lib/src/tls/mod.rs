pub mod acceptor;
pub mod backend;
pub mod cipher_suites;
pub mod curves;
pub mod metrics;
pub mod reloader;
pub mod session_resumption;
pub mod setup;

pub use acceptor::{build_rustls, build_server_config};
pub use backend::client_config;
pub use cipher_suites::{is_cipher_suite_supported, supported_cipher_suites};
pub use curves::{is_curve_supported, supported_curves};
pub use metrics::{extract_tls_info, record_tls_handshake_metrics};
pub use reloader::{watch_and_build, CertReloader};
pub use setup::ListenerTls;
