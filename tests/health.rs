//! `/health`, `/status` and startup behavior.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::http::StatusCode;
use serde_json::Value;
use tunnel_relay::config::ConfigError;
use tunnel_relay::{HttpServer, ProxyConfig};

mod common;

#[tokio::test]
async fn test_health_reports_connected_upstream() {
    let upstream = common::start_programmable_backend(|| async { (200, "up".into()) }).await;
    let relay = common::start_relay(common::relay_config(&format!("http://{upstream}"))).await;

    let res = common::client().get(relay.url("/health")).send().await.unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["tunnel"], "connected");
    assert_eq!(body["upstream_status"], 200);
}

#[tokio::test]
async fn test_health_counts_client_errors_as_reachable() {
    let upstream = common::start_programmable_backend(|| async { (404, "nope".into()) }).await;
    let relay = common::start_relay(common::relay_config(&format!("http://{upstream}"))).await;

    let res = common::client().get(relay.url("/health")).send().await.unwrap();

    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_health_reports_server_errors() {
    let upstream = common::start_programmable_backend(|| async { (502, "origin down".into()) }).await;
    let relay = common::start_relay(common::relay_config(&format!("http://{upstream}"))).await;

    let res = common::client().get(relay.url("/health")).send().await.unwrap();

    assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["status"], "unhealthy");
    assert_eq!(body["tunnel"], "responding_with_error");
}

#[tokio::test]
async fn test_health_reports_unreachable_upstream() {
    let upstream = common::unused_addr().await;
    let relay = common::start_relay(common::relay_config(&format!("http://{upstream}"))).await;

    let res = common::client().get(relay.url("/health")).send().await.unwrap();

    assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["status"], "unhealthy");
    assert_eq!(body["tunnel"], "not_accessible");
}

#[tokio::test]
async fn test_health_probes_every_call() {
    let calls = Arc::new(AtomicU32::new(0));
    let counter = calls.clone();
    let upstream = common::start_programmable_backend(move || {
        let counter = counter.clone();
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
            (200, "up".into())
        }
    })
    .await;
    let relay = common::start_relay(common::relay_config(&format!("http://{upstream}"))).await;
    let client = common::client();

    for _ in 0..3 {
        let res = client.get(relay.url("/health")).send().await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
    }

    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_status_redacts_credentials() {
    let upstream = common::start_programmable_backend(|| async { (200, "up".into()) }).await;
    let relay = common::start_relay(common::relay_config(&format!(
        "http://admin:hunter2@{upstream}/app"
    )))
    .await;

    let res = common::client().get(relay.url("/status")).send().await.unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let text = res.text().await.unwrap();
    assert!(!text.contains("hunter2"), "status leaked credentials: {text}");
    assert!(!text.contains("admin"), "status leaked credentials: {text}");

    let body: Value = serde_json::from_str(&text).unwrap();
    assert_eq!(body["proxy_status"], "running");
    assert_eq!(body["upstream_url"], format!("http://{upstream}/app"));
    assert_eq!(body["request_timeout_secs"], 30);
    assert_eq!(body["environment"], "production");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn test_status_reflects_last_probe() {
    let upstream = common::unused_addr().await;
    let relay = common::start_relay(common::relay_config(&format!("http://{upstream}"))).await;
    let client = common::client();

    let before: Value = client
        .get(relay.url("/status"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(before["last_probe_at"].is_null());
    assert!(before["last_probe_success"].is_null());

    let res = client.get(relay.url("/health")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);

    let res = client.get(relay.url("/status")).send().await.unwrap();
    // The process is up even though the upstream is not.
    assert_eq!(res.status(), StatusCode::OK);
    let after: Value = res.json().await.unwrap();
    assert_eq!(after["last_probe_success"], false);
    assert_eq!(after["last_probe_outcome"], "not_accessible");
    assert!(after["last_probe_at"].is_string());
}

#[tokio::test]
async fn test_background_monitor_records_probes() {
    let upstream = common::start_programmable_backend(|| async { (200, "up".into()) }).await;
    let mut config = common::relay_config(&format!("http://{upstream}"));
    config.timeouts.probe_interval_secs = 1;
    let relay = common::start_relay(config).await;

    // The first tick fires immediately.
    tokio::time::sleep(Duration::from_millis(500)).await;

    let body: Value = common::client()
        .get(relay.url("/status"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["last_probe_success"], true);
    assert_eq!(body["last_probe_outcome"], "connected");
}

#[test]
fn test_server_refuses_missing_upstream() {
    let result = HttpServer::new(ProxyConfig::default());
    assert!(matches!(result, Err(ConfigError::MissingUpstream)));
}

#[test]
fn test_server_refuses_malformed_upstream() {
    let config = ProxyConfig {
        upstream_url: Some("ftp://tunnel.example.com".into()),
        ..ProxyConfig::default()
    };
    let result = HttpServer::new(config);
    assert!(matches!(result, Err(ConfigError::InvalidUpstream(_))));
}
