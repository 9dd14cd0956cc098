//! Graceful shutdown tests

use std::time::Duration;

use crate::helpers::*;
use reqwest::StatusCode;

#[tokio::test]
async fn test_drain_after_shutdown() {
    let server = TestServer::start().await;
    let resp = server.get("/ping").await;
    assert_status(&resp, StatusCode::OK);

    server.server.trigger_shutdown();
    assert!(server.server.wait_for_drain(Duration::from_secs(5)).await);
    assert_eq!(server.server.active_connections(), 0);
}

#[tokio::test]
async fn test_no_new_connections_after_shutdown() {
    let server = TestServer::start().await;
    server.server.trigger_shutdown();
    assert!(server.server.wait_for_drain(Duration::from_secs(5)).await);

    // Give the accept loop a moment to observe the signal
    tokio::time::sleep(Duration::from_millis(50)).await;

    let result = reqwest::Client::new()
        .get(server.url("/ping"))
        .timeout(Duration::from_secs(1))
        .send()
        .await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_trigger_shutdown_is_idempotent() {
    let server = TestServer::start().await;
    server.server.trigger_shutdown();
    server.server.trigger_shutdown();

    assert!(server.server.wait_for_drain(Duration::from_secs(1)).await);
}
