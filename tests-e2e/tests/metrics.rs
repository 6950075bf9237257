use tests_e2e::common::{
    wait_for_service, DEFAULT_SERVICE_TIMEOUT_SECS, METRICS_URL, PROXY_HTTPS_URL,
};

async fn fetch_metrics() -> Result<String, Box<dyn std::error::Error + Send + Sync>> {
    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(5))
        .build()
        .map_err(|e| format!("Failed to create HTTP client: {e}"))?;

    let response = client
        .get(format!("{METRICS_URL}/metrics"))
        .send()
        .await
        .map_err(|e| format!("Failed to fetch metrics: {e}"))?;

    if !response.status().is_success() {
        return Err(format!("Metrics endpoint returned {}", response.status()).into());
    }

    response
        .text()
        .await
        .map_err(|e| format!("Failed to read metrics response: {e}").into())
}

fn metric_exists(metrics: &str, metric_name: &str) -> bool {
    metrics
        .lines()
        .any(|line| !line.starts_with('#') && line.starts_with(metric_name))
}

#[tokio::test]
async fn test_metrics_endpoint_available() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    assert!(
        wait_for_service(&format!("{METRICS_URL}/metrics"), DEFAULT_SERVICE_TIMEOUT_SECS).await?,
        "Metrics endpoint should be available"
    );

    let metrics = fetch_metrics().await?;
    assert!(!metrics.is_empty(), "Metrics should not be empty");

    Ok(())
}

#[tokio::test]
async fn test_request_metrics_increment() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    assert!(
        wait_for_service(PROXY_HTTPS_URL, DEFAULT_SERVICE_TIMEOUT_SECS).await?,
        "Proxy should be ready"
    );

    let client = reqwest::Client::builder()
        .danger_accept_invalid_certs(true)
        .build()
        .map_err(|e| format!("Failed to create HTTP client: {e}"))?;

    for _ in 0..5 {
        let _response = client.get(PROXY_HTTPS_URL).send().await?;
    }

    let metrics = fetch_metrics().await?;

    assert!(
        metric_exists(&metrics, "relay_requests_total"),
        "relay_requests_total should exist"
    );

    assert!(
        metric_exists(&metrics, "relay_connections_total"),
        "relay_connections_total should exist"
    );

    assert!(
        metric_exists(&metrics, "relay_connections_active"),
        "relay_connections_active should exist"
    );

    Ok(())
}

#[tokio::test]
async fn test_backend_metrics() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    assert!(
        wait_for_service(PROXY_HTTPS_URL, DEFAULT_SERVICE_TIMEOUT_SECS).await?,
        "Proxy should be ready"
    );

    let client = reqwest::Client::builder()
        .danger_accept_invalid_certs(true)
        .build()
        .map_err(|e| format!("Failed to create HTTP client: {e}"))?;

    for _ in 0..3 {
        let _response = client.get(PROXY_HTTPS_URL).send().await?;
    }

    let metrics = fetch_metrics().await?;

    assert!(
        metric_exists(&metrics, "relay_backend_requests_total"),
        "relay_backend_requests_total should exist"
    );

    assert!(
        metric_exists(&metrics, "relay_backend_duration_seconds"),
        "relay_backend_duration_seconds should exist"
    );

    assert!(
        metric_exists(&metrics, "relay_backend_selections_total"),
        "relay_backend_selections_total should exist"
    );

    assert!(
        metric_exists(&metrics, "relay_backends_alive"),
        "relay_backends_alive should exist"
    );

    Ok(())
}

#[tokio::test]
async fn test_tls_metrics() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    assert!(
        wait_for_service(PROXY_HTTPS_URL, DEFAULT_SERVICE_TIMEOUT_SECS).await?,
        "Proxy should be ready"
    );

    let client = reqwest::Client::builder()
        .danger_accept_invalid_certs(true)
        .build()
        .map_err(|e| format!("Failed to create HTTP client: {e}"))?;

    for _ in 0..3 {
        let _response = client.get(PROXY_HTTPS_URL).send().await?;
    }

    let metrics = fetch_metrics().await?;

    assert!(
        metric_exists(&metrics, "relay_tls_handshakes_total"),
        "relay_tls_handshakes_total should exist"
    );

    assert!(
        metric_exists(&metrics, "relay_tls_handshake_duration_seconds"),
        "relay_tls_handshake_duration_seconds should exist"
    );

    Ok(())
}

#[tokio::test]
async fn test_session_metrics() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    assert!(
        wait_for_service(&format!("{METRICS_URL}/metrics"), DEFAULT_SERVICE_TIMEOUT_SECS).await?,
        "Metrics endpoint should be available"
    );

    let metrics = fetch_metrics().await?;

    assert!(
        metric_exists(&metrics, "relay_sessions_active"),
        "relay_sessions_active should exist"
    );

    assert!(
        metric_exists(&metrics, "relay_sessions_expired_total"),
        "relay_sessions_expired_total should exist"
    );

    Ok(())
}

#[tokio::test]
async fn test_rate_limit_metrics() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    assert!(
        wait_for_service(&format!("{METRICS_URL}/metrics"), DEFAULT_SERVICE_TIMEOUT_SECS).await?,
        "Metrics endpoint should be available"
    );

    let metrics = fetch_metrics().await?;

    let has_rate_limit_definitions = metrics.lines().any(|line| {
        line.starts_with("# HELP relay_rate_limit") || line.starts_with("# TYPE relay_rate_limit")
    });

    if has_rate_limit_definitions {
        assert!(
            metric_exists(&metrics, "relay_rate_limit_allowed_total")
                || metric_exists(&metrics, "relay_rate_limit_rejected_total"),
            "Rate limit metrics should be present if rate limiting is configured"
        );
    }

    Ok(())
}

#[tokio::test]
async fn test_error_and_timeout_metrics() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    assert!(
        wait_for_service(&format!("{METRICS_URL}/metrics"), DEFAULT_SERVICE_TIMEOUT_SECS).await?,
        "Metrics endpoint should be available"
    );

    let metrics = fetch_metrics().await?;

    assert!(metric_exists(&metrics, "relay_errors_total"), "relay_errors_total should exist");
    assert!(metric_exists(&metrics, "relay_timeouts_total"), "relay_timeouts_total should exist");

    Ok(())
}
