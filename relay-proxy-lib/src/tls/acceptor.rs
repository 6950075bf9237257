use std::sync::Arc;

use rustls_pki_types::pem::PemObject;
use rustls_pki_types::{CertificateDer, PrivateKeyDer};
use tokio_rustls::rustls::server::{ClientHello, ResolvesServerCert, WebPkiClientVerifier};
use tokio_rustls::rustls::sign::CertifiedKey;
use tokio_rustls::rustls::{RootCertStore, ServerConfig};
use tokio_rustls::TlsAcceptor;

use crate::config::{ClientAuth, TlsConfig};
use crate::error::{ProxyError, Result};

use super::session_resumption::configure_session_resumption;

fn load_certified_key(cert_path: &str, key_path: &str) -> Result<Arc<CertifiedKey>> {
    let cert_bytes = std::fs::read(cert_path)
        .map_err(|e| ProxyError::Tls(format!("Failed to read certificate: {e}")))?;
    let certs: Vec<CertificateDer<'static>> = CertificateDer::pem_slice_iter(&cert_bytes)
        .collect::<std::result::Result<Vec<_>, rustls_pki_types::pem::Error>>()
        .map_err(|e| ProxyError::Tls(format!("Failed to parse certificates: {e}")))?;

    let key_bytes = std::fs::read(key_path)
        .map_err(|e| ProxyError::Tls(format!("Failed to read key: {e}")))?;
    let mut keys: Vec<PrivateKeyDer<'static>> = PrivateKeyDer::pem_slice_iter(&key_bytes)
        .collect::<std::result::Result<Vec<_>, rustls_pki_types::pem::Error>>()
        .map_err(|e| ProxyError::Tls(format!("Failed to parse private key: {e}")))?;
    let Some(key) = keys.pop() else {
        return Err(ProxyError::NoPrivateKey);
    };

    let signing_key = tokio_rustls::rustls::crypto::ring::sign::any_supported_type(&key)
        .map_err(|e| ProxyError::Tls(format!("Unsupported private key: {e}")))?;

    Ok(Arc::new(CertifiedKey::new(certs, signing_key)))
}

/// Selects a certificate by SNI hostname (first matching entry wins),
/// falling back to the listener's default certificate.
#[derive(Debug)]
struct SniResolver {
    entries: Vec<(String, Arc<CertifiedKey>)>,
    default: Arc<CertifiedKey>,
}

impl ResolvesServerCert for SniResolver {
    fn resolve(&self, client_hello: ClientHello<'_>) -> Option<Arc<CertifiedKey>> {
        if let Some(name) = client_hello.server_name() {
            for (hostname, key) in &self.entries {
                if hostname.eq_ignore_ascii_case(name) {
                    return Some(key.clone());
                }
            }
        }
        Some(self.default.clone())
    }
}

/// Builds a `rustls::ServerConfig` honoring the SNI map and client-auth mode.
pub fn build_server_config(cfg: &TlsConfig) -> Result<Arc<ServerConfig>> {
    let default = load_certified_key(&cfg.cert_path, &cfg.key_path)?;
    let mut entries = Vec::with_capacity(cfg.sni.len());
    for sni in &cfg.sni {
        entries.push((sni.hostname.clone(), load_certified_key(&sni.cert_path, &sni.key_path)?));
    }
    let resolver = Arc::new(SniResolver { entries, default });

    let builder = ServerConfig::builder();
    let mut server = match &cfg.client_auth {
        ClientAuth::Disabled => builder.with_no_client_auth(),
        ClientAuth::Required { ca_cert_path } => {
            let ca_bytes = std::fs::read(ca_cert_path)
                .map_err(|e| ProxyError::Tls(format!("Failed to read client CA: {e}")))?;
            let mut roots = RootCertStore::empty();
            for cert in CertificateDer::pem_slice_iter(&ca_bytes) {
                let cert = cert
                    .map_err(|e| ProxyError::Tls(format!("Failed to parse client CA: {e}")))?;
                roots
                    .add(cert)
                    .map_err(|e| ProxyError::Tls(format!("Invalid client CA: {e}")))?;
            }
            let verifier = WebPkiClientVerifier::builder(Arc::new(roots))
                .build()
                .map_err(|e| ProxyError::Tls(format!("Failed to build client verifier: {e}")))?;
            builder.with_client_cert_verifier(verifier)
        }
    }
    .with_cert_resolver(resolver);

    server.alpn_protocols = if !cfg.alpn.is_empty() {
        cfg.alpn.iter().map(|s| s.as_bytes().to_vec()).collect()
    } else {
        vec![b"h2".to_vec(), b"http/1.1".to_vec()]
    };

    configure_session_resumption(&mut server, &cfg.session_resumption);

    Ok(Arc::new(server))
}

/// Builds a `TlsAcceptor` from configuration.
pub fn build_rustls(cfg: &TlsConfig) -> Result<TlsAcceptor> {
    Ok(TlsAcceptor::from(build_server_config(cfg)?))
}
