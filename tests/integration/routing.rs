//! Route matching and dispatch tests

use crate::helpers::*;
use reqwest::StatusCode;
use serde_json::json;

#[tokio::test]
async fn test_home_page() {
    let server = TestServer::start().await;
    let resp = server.get("/").await;

    assert_status(&resp, StatusCode::OK);
    assert!(resp
        .headers()
        .get("content-type")
        .unwrap()
        .to_str()
        .unwrap()
        .starts_with("text/html"));
    assert_eq!(resp.text().await.unwrap(), "<h1>Home</h1>");
}

#[tokio::test]
async fn test_welcome_page_without_routes() {
    let server = TestServer::with_options(TestOptions {
        no_routes: true,
        ..Default::default()
    })
    .await;

    let resp = server.get("/anything").await;
    assert_status(&resp, StatusCode::OK);
    assert_eq!(resp.text().await.unwrap(), "<h1>Hello World</h1>");
}

#[tokio::test]
async fn test_closure_route_with_param() {
    let server = TestServer::start().await;
    let resp = server.get("/hello/World").await;

    assert_status(&resp, StatusCode::OK);
    assert_eq!(resp.text().await.unwrap(), "Hello, World!");
}

#[tokio::test]
async fn test_trailing_slash_is_ignored() {
    let server = TestServer::start().await;
    let resp = server.get("/hello/World/").await;

    assert_status(&resp, StatusCode::OK);
    assert_eq!(resp.text().await.unwrap(), "Hello, World!");
}

#[tokio::test]
async fn test_params_are_percent_decoded() {
    let server = TestServer::start().await;
    let resp = server.get("/hello/J%C3%BCrgen%20K").await;

    assert_eq!(resp.text().await.unwrap(), "Hello, Jürgen K!");
}

#[tokio::test]
async fn test_controller_action_with_constraint() {
    let server = TestServer::start().await;

    let resp = server.get("/users/42").await;
    assert_status(&resp, StatusCode::OK);
    assert_eq!(body_json(resp).await, json!({"id": 42}));

    // Constraint rejects non-digits
    let resp = server.get("/users/abc").await;
    assert_status(&resp, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_optional_segments() {
    let server = TestServer::start().await;

    let resp = server.get("/archive").await;
    assert_eq!(body_json(resp).await, json!({}));

    let resp = server.get("/archive/2024").await;
    assert_eq!(body_json(resp).await, json!({"year": "2024"}));

    let resp = server.get("/archive/2024/05").await;
    assert_eq!(body_json(resp).await, json!({"year": "2024", "month": "05"}));

    let resp = server.get("/archive/24").await;
    assert_status(&resp, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_invokable_controller() {
    let server = TestServer::start().await;
    let resp = server.get("/ping").await;

    assert_status(&resp, StatusCode::OK);
    assert_eq!(resp.text().await.unwrap(), "pong");
}

#[tokio::test]
async fn test_non_invokable_controller_fails() {
    let server = TestServer::start().await;
    let resp = server.get("/broken").await;

    assert_status(&resp, StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_unbound_controller_fails() {
    let server = TestServer::start().await;
    let resp = server.get("/ghost").await;

    assert_status(&resp, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(server.log_contents().contains("GhostController"));
}

#[tokio::test]
async fn test_favicon_is_empty() {
    let server = TestServer::start().await;
    let resp = server.get("/favicon.ico").await;

    assert_status(&resp, StatusCode::NO_CONTENT);
    assert!(resp.bytes().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_head_falls_back_to_get() {
    let server = TestServer::start().await;
    let resp = server
        .client
        .head(server.url("/hello/World"))
        .send()
        .await
        .unwrap();

    assert_status(&resp, StatusCode::OK);
    assert!(resp.bytes().await.unwrap().is_empty());
}
