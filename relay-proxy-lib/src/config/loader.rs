use std::collections::HashSet;
use std::fs;
use std::path::Path;

use crate::config::{BackendKind, Config, ServiceConfig, SessionPolicyConfig};
use crate::error::{ProxyError, Result};

pub fn load_from_path<P: AsRef<Path>>(p: P) -> Result<Config> {
    let txt = fs::read_to_string(p)
        .map_err(|e| ProxyError::Config(format!("Failed to read config file: {e}")))?;
    let cfg: Config = toml::from_str(&txt)
        .map_err(|e| ProxyError::Config(format!("Failed to parse config: {e}")))?;

    validate_config(&cfg)?;

    Ok(cfg)
}

fn validate_config(cfg: &Config) -> Result<()> {
    if cfg.listener.is_empty() {
        return Err(ProxyError::NoListeners);
    }

    for svc in &cfg.service {
        if !svc.global {
            return Err(ProxyError::Config(format!(
                "top-level service {:?} must set global = true",
                svc.name
            )));
        }
    }

    for lstn in &cfg.listener {
        if let Some(tls) = &lstn.tls {
            if !Path::new(&tls.cert_path).exists() {
                return Err(ProxyError::Config(format!(
                    "Certificate file not found: {}",
                    tls.cert_path
                )));
            }
            if !Path::new(&tls.key_path).exists() {
                return Err(ProxyError::Config(format!(
                    "Key file not found: {}",
                    tls.key_path
                )));
            }
            for sni in &tls.sni {
                if !Path::new(&sni.cert_path).exists() {
                    return Err(ProxyError::Config(format!(
                        "Certificate file not found for sni {:?}: {}",
                        sni.hostname, sni.cert_path
                    )));
                }
                if !Path::new(&sni.key_path).exists() {
                    return Err(ProxyError::Config(format!(
                        "Key file not found for sni {:?}: {}",
                        sni.hostname, sni.key_path
                    )));
                }
            }
        }

        let services: Vec<&ServiceConfig> =
            lstn.service.iter().chain(cfg.service.iter()).collect();
        if services.is_empty() {
            return Err(ProxyError::Config(format!(
                "listener {} has no services configured (neither local nor global)",
                lstn.address
            )));
        }

        for svc in services {
            validate_service(svc)?;
        }
    }

    Ok(())
}

fn validate_service(svc: &ServiceConfig) -> Result<()> {
    if svc.backend.is_empty() && svc.emergency_backend.is_none() {
        return Err(ProxyError::Config(format!(
            "service {:?} has no backends and no emergency backend",
            svc.name
        )));
    }

    let requires_pattern = !matches!(
        svc.session,
        SessionPolicyConfig::None | SessionPolicyConfig::ClientIp | SessionPolicyConfig::HttpBasic
    );
    if requires_pattern && (svc.session_start.is_none() || svc.session_pattern.is_none()) {
        return Err(ProxyError::Config(format!(
            "service {:?} session policy requires session_start and session_pattern",
            svc.name
        )));
    }

    if let Some(becookie) = &svc.becookie {
        let bekeys: HashSet<&str> =
            svc.backend.iter().filter_map(|b| b.bekey.as_deref()).collect();
        if bekeys.is_empty() {
            return Err(ProxyError::Config(format!(
                "service {:?} declares becookie {:?} but no backend declares a bekey",
                svc.name, becookie
            )));
        }
    }

    for backend in &svc.backend {
        if let BackendKind::Redirect { target, .. } = &backend.kind {
            if target.is_empty() {
                return Err(ProxyError::Config(format!(
                    "service {:?} has a redirect backend with an empty target",
                    svc.name
                )));
            }
        }
    }

    Ok(())
}
