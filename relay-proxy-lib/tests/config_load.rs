use std::fs;
use std::path::PathBuf;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use relay_proxy_lib::config::{load_from_path, BackendKind};

fn tmp_path(name: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_else(|_| Duration::from_secs(0))
        .as_nanos();
    std::env::temp_dir().join(format!("relay-proxy-{nanos}-{name}.toml"))
}

#[test]
fn loads_minimal_config() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let path = tmp_path("minimal");
    let toml = r#"
[[listener]]
address = "127.0.0.1:0"

[[listener.service]]
name = "default"
backend = [{ address = "localhost:9000" }]
"#;
    fs::write(&path, toml)?;

    let cfg = load_from_path(&path)?;
    assert_eq!(cfg.listener.len(), 1);
    assert_eq!(cfg.listener[0].service.len(), 1);
    assert_eq!(cfg.listener[0].service[0].backend.len(), 1);
    assert_eq!(cfg.listener[0].service[0].backend[0].address, "localhost:9000");
    assert_eq!(cfg.listener[0].service[0].backend[0].kind, BackendKind::Normal);

    fs::remove_file(&path)?;
    Ok(())
}

#[test]
fn rejects_config_with_no_listeners() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let path = tmp_path("no-listeners");
    fs::write(&path, "listener = []\n")?;

    assert!(load_from_path(&path).is_err());

    fs::remove_file(&path)?;
    Ok(())
}

#[test]
fn rejects_listener_with_no_services() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let path = tmp_path("no-services");
    let toml = r#"
[[listener]]
address = "127.0.0.1:0"
"#;
    fs::write(&path, toml)?;

    let err = load_from_path(&path).unwrap_err();
    assert!(err.to_string().contains("no services"));

    fs::remove_file(&path)?;
    Ok(())
}

#[test]
fn rejects_service_with_no_backends() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let path = tmp_path("no-backends");
    let toml = r#"
[[listener]]
address = "127.0.0.1:0"

[[listener.service]]
name = "empty"
backend = []
"#;
    fs::write(&path, toml)?;

    let err = load_from_path(&path).unwrap_err();
    assert!(err.to_string().contains("no backends"));

    fs::remove_file(&path)?;
    Ok(())
}

#[test]
fn rejects_global_service_without_global_flag(
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let path = tmp_path("global-flag");
    let toml = r#"
[[listener]]
address = "127.0.0.1:0"

[[service]]
name = "shared"
backend = [{ address = "localhost:9000" }]
"#;
    fs::write(&path, toml)?;

    let err = load_from_path(&path).unwrap_err();
    assert!(err.to_string().contains("global"));

    fs::remove_file(&path)?;
    Ok(())
}

#[test]
fn parses_redirect_backend() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let path = tmp_path("redirect");
    let toml = r#"
[[listener]]
address = "127.0.0.1:0"

[[listener.service]]
name = "default"

[[listener.service.backend]]
address = "unused"
kind = "redirect"
target = "https://example.com"
"#;
    fs::write(&path, toml)?;

    let cfg = load_from_path(&path)?;
    match &cfg.listener[0].service[0].backend[0].kind {
        BackendKind::Redirect { target, status, .. } => {
            assert_eq!(target, "https://example.com");
            assert_eq!(*status, 302);
        }
        BackendKind::Normal => panic!("expected a redirect backend"),
    }

    fs::remove_file(&path)?;
    Ok(())
}

#[test]
fn rejects_redirect_backend_with_empty_target(
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let path = tmp_path("redirect-empty-target");
    let toml = r#"
[[listener]]
address = "127.0.0.1:0"

[[listener.service]]
name = "default"

[[listener.service.backend]]
address = "unused"
kind = "redirect"
target = ""
"#;
    fs::write(&path, toml)?;

    let err = load_from_path(&path).unwrap_err();
    assert!(err.to_string().contains("empty target"));

    fs::remove_file(&path)?;
    Ok(())
}
