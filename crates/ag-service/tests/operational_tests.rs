//! Operational endpoint integration tests.
//!
//! Tests `/health`, `/ready`, and `/metrics` using the `TestAgServer`
//! harness.

// Test code is allowed to use expect/unwrap for assertions
#![allow(clippy::unwrap_used, clippy::expect_used)]

use ag_service::revocation::mock::MockRevocationStore;
use ag_test_utils::TestAgServer;
use std::sync::Arc;

const UNREACHABLE_REFRESH: &str = "http://127.0.0.1:1/refresh";

/// Test that the health endpoint returns 200 OK.
#[tokio::test]
async fn test_health_endpoint_returns_200() -> Result<(), anyhow::Error> {
    let server =
        TestAgServer::spawn(Arc::new(MockRevocationStore::empty()), UNREACHABLE_REFRESH).await?;
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{}/health", server.url()))
        .send()
        .await?;

    assert_eq!(response.status(), 200);
    assert_eq!(response.text().await?, "OK");

    Ok(())
}

/// Test that readiness reports a reachable revocation store as healthy.
#[tokio::test]
async fn test_ready_endpoint_reports_healthy_store() -> Result<(), anyhow::Error> {
    let server =
        TestAgServer::spawn(Arc::new(MockRevocationStore::empty()), UNREACHABLE_REFRESH).await?;
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{}/ready", server.url()))
        .send()
        .await?;

    assert_eq!(response.status(), 200);

    let content_type = response
        .headers()
        .get("content-type")
        .and_then(|v| v.to_str().ok());
    assert!(
        content_type.is_some_and(|ct| ct.contains("application/json")),
        "Expected application/json content type, got {:?}",
        content_type
    );

    let body: serde_json::Value = response.json().await?;
    assert_eq!(body["status"], "ready");
    assert_eq!(body["revocation_store"], "healthy");

    Ok(())
}

/// Test that readiness stays 200 during a store outage and reports it.
#[tokio::test]
async fn test_ready_endpoint_reports_degraded_store() -> Result<(), anyhow::Error> {
    let server =
        TestAgServer::spawn(Arc::new(MockRevocationStore::failing()), UNREACHABLE_REFRESH).await?;
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{}/ready", server.url()))
        .send()
        .await?;

    // Decisions fail open, so a store outage must not pull the gateway out
    // of the load balancer
    assert_eq!(response.status(), 200);

    let body: serde_json::Value = response.json().await?;
    assert_eq!(body["status"], "ready");
    assert_eq!(body["revocation_store"], "degraded");

    Ok(())
}

/// Test that the metrics endpoint exposes gateway metrics after traffic.
#[tokio::test]
async fn test_metrics_endpoint_exposes_gateway_metrics() -> Result<(), anyhow::Error> {
    let server =
        TestAgServer::spawn(Arc::new(MockRevocationStore::empty()), UNREACHABLE_REFRESH).await?;
    let client = reqwest::Client::new();

    // Generate one operational hit and one anonymous decision
    client
        .get(format!("{}/health", server.url()))
        .send()
        .await?;
    client
        .get(format!("{}/any/path", server.url()))
        .send()
        .await?;

    let response = client
        .get(format!("{}/metrics", server.url()))
        .send()
        .await?;

    assert_eq!(response.status(), 200);

    let body = response.text().await?;
    assert!(
        body.contains("ag_http_requests_total"),
        "Expected ag_http_requests_total in metrics output"
    );
    assert!(
        body.contains("ag_auth_decisions_total"),
        "Expected ag_auth_decisions_total in metrics output"
    );

    Ok(())
}

/// Test that unknown paths are decision requests, not 404s.
#[tokio::test]
async fn test_every_path_is_a_decision() -> Result<(), anyhow::Error> {
    let server =
        TestAgServer::spawn(Arc::new(MockRevocationStore::empty()), UNREACHABLE_REFRESH).await?;
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{}/v1/nonexistent", server.url()))
        .send()
        .await?;

    assert_eq!(response.status(), 204);

    Ok(())
}
