use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use http::Version;
use hyper::body::Incoming;
use hyper_rustls::{HttpsConnector, HttpsConnectorBuilder};
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;

use crate::config::KeepAliveConfig;
use crate::core::backend::{BackEnd, BackendAddress};

pub type HttpClient = Client<HttpsConnector<HttpConnector>, Incoming>;

/// Shared HTTP client pool for backend connections.
///
/// One client is cached per distinct `(address, tls?)` pair so that
/// keep-alive connections are reused across requests to the same back-end,
/// while back-ends with their own TLS trust configuration (`tls_ca_cert_path`)
/// each get a connector built from their own `ClientConfig`.
#[derive(Clone)]
pub struct ClientPool {
    keep_alive: KeepAliveConfig,
    clients: Arc<Mutex<HashMap<(BackendAddress, Version), Arc<HttpClient>>>>,
}

impl ClientPool {
    pub fn new(keep_alive: &KeepAliveConfig) -> Self {
        Self { keep_alive: keep_alive.clone(), clients: Arc::new(Mutex::new(HashMap::new())) }
    }

    /// Returns the pooled client for `backend` at the given HTTP version,
    /// building and caching one on first use.
    pub fn client_for(&self, backend: &BackEnd, version: Version) -> Arc<HttpClient> {
        let key = (backend.address.clone(), version);
        if let Ok(clients) = self.clients.lock() {
            if let Some(client) = clients.get(&key) {
                return client.clone();
            }
        }

        let client = Arc::new(self.build_client(backend, version));
        if let Ok(mut clients) = self.clients.lock() {
            clients.entry(key).or_insert_with(|| client.clone());
        }
        client
    }

    fn build_connector(&self, backend: &BackEnd) -> HttpsConnector<HttpConnector> {
        let builder = match &backend.tls_client_config {
            Some(tls_config) => HttpsConnectorBuilder::new().with_tls_config((**tls_config).clone()),
            None => HttpsConnectorBuilder::new()
                .with_native_roots()
                .expect("native root store must be loadable"),
        };
        builder.https_or_http().enable_all_versions().build()
    }

    fn build_client(&self, backend: &BackEnd, version: Version) -> HttpClient {
        let connector = self.build_connector(backend);
        let mut builder = Client::builder(TokioExecutor::new());
        if version == Version::HTTP_2 {
            builder.http2_only(true);
        }
        builder.build(connector)
    }
}
