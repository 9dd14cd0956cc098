//! Error logging, alerting and request id tests

use std::time::Duration;

use crate::helpers::*;
use careminate::logging::LogLevel;
use reqwest::StatusCode;

#[tokio::test]
async fn test_server_error_is_logged() {
    let server = TestServer::start().await;
    let resp = server.get("/fail").await;
    assert_status(&resp, StatusCode::INTERNAL_SERVER_ERROR);

    let log = server.log_contents();
    assert!(log.contains("[ERROR] database exploded"), "log was: {}", log);
    assert!(log.contains("\"status\": 500"));
}

#[tokio::test]
async fn test_client_error_logged_as_info() {
    let server = TestServer::start().await;
    server.get("/missing").await;

    let log = server.log_contents();
    assert!(log.contains("[INFO] Not found"), "log was: {}", log);
    assert!(!log.contains("[ERROR]"));
}

#[tokio::test]
async fn test_auth_context_is_logged() {
    let server = TestServer::start().await;
    server.get("/secret").await;

    let log = server.log_contents();
    assert!(log.contains("Token expired"));
    assert!(log.contains("\"user\": 7"));
}

#[tokio::test]
async fn test_error_alert_delivered() {
    let server = TestServer::start().await;
    server.get("/fail").await;

    // Alerts are dispatched on a background task
    let mut delivered = Vec::new();
    for _ in 0..50 {
        delivered = server.alerts.alerts.lock().unwrap().clone();
        if !delivered.is_empty() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    assert_eq!(delivered.len(), 1);
    assert_eq!(delivered[0].level, LogLevel::Error);
    assert_eq!(delivered[0].channel, "test");
    assert!(delivered[0].message.contains("database exploded"));
}

#[tokio::test]
async fn test_no_alert_below_threshold() {
    let server = TestServer::start().await;
    server.get("/missing").await;
    tokio::time::sleep(Duration::from_millis(100)).await;

    assert!(server.alerts.alerts.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_request_id_generated() {
    let server = TestServer::start().await;
    let resp = server.get("/").await;

    let id = resp
        .headers()
        .get("x-request-id")
        .expect("Missing x-request-id")
        .to_str()
        .unwrap();
    assert_eq!(id.len(), 16);
    assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
}

#[tokio::test]
async fn test_request_id_propagated() {
    let server = TestServer::start().await;
    let resp = server
        .get_with_headers("/fail", &[("X-Request-ID", "req-abc.123")])
        .await;

    assert_header(&resp, "x-request-id", "req-abc.123");
    assert!(server.log_contents().contains("\"request_id\": \"req-abc.123\""));
}

#[tokio::test]
async fn test_invalid_request_id_replaced() {
    let server = TestServer::start().await;
    let resp = server
        .get_with_headers("/", &[("X-Request-ID", "bad id!")])
        .await;

    let id = resp.headers().get("x-request-id").unwrap().to_str().unwrap();
    assert_ne!(id, "bad id!");
    assert_eq!(id.len(), 16);
}
