use std::fmt::Write as _;
use std::fs;
use std::path::PathBuf;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use http::StatusCode;
use relay_proxy_lib::config::load_from_path;
use relay_proxy_lib::core::rescale::run_rescale_pass;
use relay_proxy_lib::core::Service;

fn tmp_path(name: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_else(|_| Duration::from_secs(0))
        .as_nanos();
    std::env::temp_dir().join(format!("relay-proxy-rescale-{nanos}-{name}.toml"))
}

async fn load_service(name: &str, toml: &str) -> Service {
    let path = tmp_path(name);
    fs::write(&path, toml).unwrap();
    let cfg = load_from_path(&path).unwrap();
    fs::remove_file(&path).unwrap();
    Service::from_config(&cfg.listener[0].service[0]).await.unwrap()
}

/// `n` backends at 10.0.0.{i}:8000, all priority 2.
fn many_backends_toml(n: usize) -> String {
    let mut toml = String::from(
        "[[listener]]\naddress = \"127.0.0.1:0\"\n\n[[listener.service]]\nname = \"rescale\"\ndynamic_rescale = true\n\n",
    );
    for i in 0..n {
        writeln!(toml, "[[listener.service.backend]]\naddress = \"10.0.0.{}:8000\"\npriority = 2\n", i + 1)
            .unwrap();
    }
    toml
}

/// A single outlier's z-score against the *other* n-1 identical backends is
/// `(n-1)/sqrt(n)` under sample stddev — independent of how large the gap
/// itself is. At `n = 15` that's `14/sqrt(15) ≈ 3.6`, comfortably past the
/// `3σ` threshold without sitting near the boundary.
#[tokio::test]
async fn rescale_raises_priority_of_a_clear_fast_outlier() {
    let n = 15;
    let service = Arc::new(load_service("outlier", &many_backends_toml(n)).await);

    for backend in &service.backends[..n - 1] {
        for _ in 0..60 {
            backend.record_response(Duration::from_millis(100), StatusCode::OK);
        }
    }
    let outlier = &service.backends[n - 1];
    for _ in 0..60 {
        outlier.record_response(Duration::from_millis(1), StatusCode::OK);
    }

    let before = outlier.priority();
    run_rescale_pass(&[service.clone()]);
    let after = outlier.priority();

    assert!(after > before, "fast outlier's priority should have been raised: {before} -> {after}");
}

#[tokio::test]
async fn rescale_skips_services_with_fewer_than_two_routable_backends() {
    let service = Arc::new(
        load_service(
            "lone-backend",
            r#"
[[listener]]
address = "127.0.0.1:0"

[[listener.service]]
name = "lone"
dynamic_rescale = true

[[listener.service.backend]]
address = "10.0.0.1:8000"
priority = 2
"#,
        )
        .await,
    );

    for _ in 0..60 {
        service.backends[0].record_response(Duration::from_millis(1), StatusCode::OK);
    }

    let before = service.backends[0].priority.load(Ordering::Acquire);
    run_rescale_pass(&[service.clone()]);
    let after = service.backends[0].priority.load(Ordering::Acquire);

    assert_eq!(before, after, "a single-backend service has nothing to compare against");
}
