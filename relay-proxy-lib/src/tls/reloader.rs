use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use notify::{Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::watch;
use tokio_rustls::rustls::ServerConfig;
use tracing::{info, warn};

use crate::config::TlsConfig;
use crate::error::{ProxyError, Result};

use super::acceptor::build_server_config;

/// Keeps the filesystem watcher alive for as long as the listener it serves.
pub struct CertReloader {
    _watcher: RecommendedWatcher,
}

/// Builds the initial `ServerConfig` and spawns a background task that
/// rebuilds it on certificate/key file changes, publishing the result over
/// a `watch` channel. Events are debounced by `watch_delay_secs` to absorb
/// the burst of events a single editor save or `certbot renew` produces.
pub fn watch_and_build(
    cfg: Arc<TlsConfig>,
) -> Result<(watch::Sender<Arc<ServerConfig>>, watch::Receiver<Arc<ServerConfig>>, CertReloader)> {
    let initial = build_server_config(&cfg)?;
    let (tx, rx) = watch::channel(initial);

    let (evt_tx, mut evt_rx) = tokio::sync::mpsc::unbounded_channel::<()>();
    let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
        if res.is_ok() {
            let _ = evt_tx.send(());
        }
    })
    .map_err(|e| ProxyError::Tls(format!("failed to create certificate file watcher: {e}")))?;

    for dir in watched_dirs(&cfg) {
        watcher
            .watch(&dir, RecursiveMode::NonRecursive)
            .map_err(|e| ProxyError::Tls(format!("failed to watch {}: {e}", dir.display())))?;
    }

    let debounce = Duration::from_secs(cfg.watch_delay_secs.max(1) as u64);
    let cfg_for_task = cfg.clone();
    let tx_for_task = tx.clone();
    tokio::spawn(async move {
        while evt_rx.recv().await.is_some() {
            tokio::time::sleep(debounce).await;
            while evt_rx.try_recv().is_ok() {}

            match build_server_config(&cfg_for_task) {
                Ok(new_config) => {
                    let _ = tx_for_task.send(new_config);
                    info!("TLS certificates reloaded");
                }
                Err(e) => {
                    warn!(error = %e, "failed to reload TLS certificates, keeping previous config");
                }
            }
        }
    });

    Ok((tx, rx, CertReloader { _watcher: watcher }))
}

fn watched_dirs(cfg: &TlsConfig) -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from(&cfg.cert_path), PathBuf::from(&cfg.key_path)];
    for sni in &cfg.sni {
        paths.push(PathBuf::from(&sni.cert_path));
        paths.push(PathBuf::from(&sni.key_path));
    }

    let mut dirs: Vec<PathBuf> = paths
        .iter()
        .map(|p| p.parent().unwrap_or(Path::new(".")).to_path_buf())
        .collect();
    dirs.sort();
    dirs.dedup();
    dirs
}
