//! Error rendering tests

use crate::helpers::*;
use reqwest::StatusCode;
use serde_json::json;

#[tokio::test]
async fn test_not_found_text() {
    let server = TestServer::start().await;
    let resp = server.get("/missing").await;

    assert_status(&resp, StatusCode::NOT_FOUND);
    assert_eq!(resp.text().await.unwrap(), "Not Found");
}

#[tokio::test]
async fn test_not_found_json() {
    let server = TestServer::start().await;
    let resp = server
        .get_with_headers("/missing", &[("Accept", "application/json")])
        .await;

    assert_status(&resp, StatusCode::NOT_FOUND);
    assert_eq!(
        body_json(resp).await,
        json!({"error": "Not found", "status": 404})
    );
}

#[tokio::test]
async fn test_method_not_allowed() {
    let server = TestServer::start().await;
    let resp = server
        .client
        .put(server.url("/users"))
        .send()
        .await
        .unwrap();

    assert_status(&resp, StatusCode::METHOD_NOT_ALLOWED);
    assert_header(&resp, "allow", "POST");
}

#[tokio::test]
async fn test_method_not_allowed_lists_every_method() {
    let server = TestServer::start().await;
    let resp = server
        .client
        .patch(server.url("/users/1"))
        .header("Accept", "application/json")
        .send()
        .await
        .unwrap();

    assert_status(&resp, StatusCode::METHOD_NOT_ALLOWED);
    assert_header(&resp, "allow", "GET, DELETE");
    assert_eq!(
        body_json(resp).await,
        json!({"error": "The allowed methods are GET, DELETE", "status": 405})
    );
}

#[tokio::test]
async fn test_server_error_hidden_in_production() {
    let server = TestServer::start().await;
    let resp = server
        .get_with_headers("/fail", &[("Accept", "application/json")])
        .await;

    assert_status(&resp, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body_json(resp).await,
        json!({"error": "Internal Server Error", "status": 500})
    );
}

#[tokio::test]
async fn test_client_error_message_is_public() {
    let server = TestServer::start().await;
    let resp = server
        .get_with_headers("/secret", &[("Accept", "application/json")])
        .await;

    assert_status(&resp, StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(resp).await["error"], "Token expired");
}

#[tokio::test]
async fn test_debug_report_html() {
    let server = TestServer::with_options(TestOptions {
        debug: true,
        ..Default::default()
    })
    .await;
    let resp = server
        .get_with_headers("/fail", &[("Accept", "text/html")])
        .await;

    assert_status(&resp, StatusCode::INTERNAL_SERVER_ERROR);
    let body = resp.text().await.unwrap();
    assert!(body.starts_with("<pre>"));
    assert!(body.contains("Exception: database exploded"));
    assert!(body.contains("Status: 500 Internal Server Error"));
}

#[tokio::test]
async fn test_debug_json_shows_message() {
    let server = TestServer::with_options(TestOptions {
        debug: true,
        ..Default::default()
    })
    .await;
    let resp = server
        .get_with_headers("/fail", &[("Accept", "application/json")])
        .await;

    assert_eq!(body_json(resp).await["error"], "database exploded");
}

#[tokio::test]
async fn test_custom_error_page() {
    let server = TestServer::with_options(TestOptions {
        error_pages: vec![(404, "<h1>Lost?</h1>")],
        ..Default::default()
    })
    .await;

    let resp = server
        .get_with_headers("/missing", &[("Accept", "text/html")])
        .await;
    assert_status(&resp, StatusCode::NOT_FOUND);
    assert_eq!(resp.text().await.unwrap(), "<h1>Lost?</h1>");

    // No page for 500, falls back to the reason phrase
    let resp = server
        .get_with_headers("/fail", &[("Accept", "text/html")])
        .await;
    assert_eq!(resp.text().await.unwrap(), "Internal Server Error");
}

#[tokio::test]
async fn test_error_page_skipped_for_plain_clients() {
    let server = TestServer::with_options(TestOptions {
        error_pages: vec![(404, "<h1>Lost?</h1>")],
        ..Default::default()
    })
    .await;

    let resp = server
        .get_with_headers("/missing", &[("Accept", "text/plain")])
        .await;
    assert_eq!(resp.text().await.unwrap(), "Not Found");
}
