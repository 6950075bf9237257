use std::sync::Arc;

use rustls_pki_types::pem::PemObject;
use rustls_pki_types::CertificateDer;
use tokio_rustls::rustls::{ClientConfig, RootCertStore};

use crate::error::{ProxyError, Result};

/// Builds a `rustls::ClientConfig` for connecting to a TLS-terminated
/// back-end, trusting the platform's native root store plus an optional
/// extra CA for private/self-signed upstreams.
pub fn client_config(extra_ca_path: Option<&str>) -> Result<Arc<ClientConfig>> {
    let mut roots = RootCertStore::empty();

    let native = rustls_native_certs::load_native_certs();
    for err in &native.errors {
        tracing::warn!(error = %err, "failed to load a native root certificate");
    }
    for cert in native.certs {
        // Malformed native entries are rare and not actionable; skip them.
        let _ = roots.add(cert);
    }

    if let Some(path) = extra_ca_path {
        let bytes = std::fs::read(path)
            .map_err(|e| ProxyError::Tls(format!("failed to read backend CA {path}: {e}")))?;
        for cert in CertificateDer::pem_slice_iter(&bytes) {
            let cert = cert
                .map_err(|e| ProxyError::Tls(format!("failed to parse backend CA {path}: {e}")))?;
            roots
                .add(cert)
                .map_err(|e| ProxyError::Tls(format!("invalid backend CA {path}: {e}")))?;
        }
    }

    let config = ClientConfig::builder().with_root_certificates(roots).with_no_client_auth();
    Ok(Arc::new(config))
}
