//! Request parsing tests: query strings, forms, JSON, uploads, spoofing

use crate::helpers::*;
use reqwest::multipart::{Form, Part};
use reqwest::StatusCode;
use serde_json::json;

#[tokio::test]
async fn test_query_string_brackets() {
    let server = TestServer::start().await;
    let resp = server
        .get("/query?page=2&tags[]=rust&tags[]=web&user[name]=ada&q=a+b%21")
        .await;

    assert_status(&resp, StatusCode::OK);
    assert_eq!(
        body_json(resp).await,
        json!({
            "page": "2",
            "tags": ["rust", "web"],
            "user": {"name": "ada"},
            "q": "a b!",
        })
    );
}

#[tokio::test]
async fn test_form_post() {
    let server = TestServer::start().await;
    let resp = server
        .post_form("/users", &[("name", "Ada"), ("email", "ada@example.com")])
        .await;

    assert_status(&resp, StatusCode::CREATED);
    assert_eq!(
        body_json(resp).await,
        json!({"created": {"name": "Ada", "email": "ada@example.com"}})
    );
}

#[tokio::test]
async fn test_json_body() {
    let server = TestServer::start().await;
    let resp = server
        .post_json("/echo", &json!({"name": "Ada", "roles": ["admin"]}))
        .await;

    assert_status(&resp, StatusCode::OK);
    assert_eq!(
        body_json(resp).await,
        json!({"json": true, "input": {"name": "Ada", "roles": ["admin"]}})
    );
}

#[tokio::test]
async fn test_method_spoofing() {
    let server = TestServer::start().await;
    let resp = server
        .post_form("/users/5", &[("_method", "delete")])
        .await;

    assert_status(&resp, StatusCode::OK);
    assert_eq!(resp.text().await.unwrap(), "deleted 5");
}

#[tokio::test]
async fn test_method_override_header() {
    let server = TestServer::start().await;
    let resp = server
        .client
        .post(server.url("/users/9"))
        .header("X-HTTP-Method-Override", "DELETE")
        .send()
        .await
        .unwrap();

    assert_eq!(resp.text().await.unwrap(), "deleted 9");
}

#[tokio::test]
async fn test_multipart_upload() {
    let server = TestServer::start().await;
    let form = Form::new().text("title", "Report").part(
        "doc",
        Part::bytes(b"hello world".to_vec())
            .file_name("report.txt")
            .mime_str("text/plain")
            .unwrap(),
    );

    let resp = server
        .client
        .post(server.url("/upload"))
        .multipart(form)
        .send()
        .await
        .unwrap();

    assert_status(&resp, StatusCode::OK);
    assert_eq!(
        body_json(resp).await,
        json!({"title": "Report", "name": "report.txt", "size": 11, "valid": true})
    );
    assert!(
        std::fs::read_dir(&server.upload_dir).unwrap().next().is_none(),
        "Uploads should be removed once the response is sent"
    );
}

#[tokio::test]
async fn test_uploads_removed_after_each_request() {
    let server = TestServer::start().await;

    for i in 0..3 {
        let form = Form::new().part(
            "doc",
            Part::bytes(b"abc".to_vec()).file_name(format!("note{}.txt", i)),
        );
        let resp = server
            .client
            .post(server.url("/upload"))
            .multipart(form)
            .send()
            .await
            .unwrap();
        assert_eq!(body_json(resp).await["valid"], true);
    }

    assert_eq!(std::fs::read_dir(&server.upload_dir).unwrap().count(), 0);
}

#[tokio::test]
async fn test_multipart_without_file() {
    let server = TestServer::start().await;
    let form = Form::new().text("title", "Nothing attached");

    let resp = server
        .client
        .post(server.url("/upload"))
        .multipart(form)
        .send()
        .await
        .unwrap();

    assert_eq!(
        body_json(resp).await,
        json!({"title": "Nothing attached", "name": null, "size": null, "valid": false})
    );
}

#[tokio::test]
async fn test_malformed_multipart_rejected() {
    let server = TestServer::start().await;
    let resp = server
        .client
        .post(server.url("/upload"))
        .header("content-type", "multipart/form-data")
        .body("not multipart")
        .send()
        .await
        .unwrap();

    assert_status(&resp, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_deeply_nested_form_key_is_dropped() {
    let server = TestServer::start().await;
    let key = format!("a{}", "[]".repeat(200_000));

    let resp = server
        .post_form("/users", &[(key.as_str(), "1"), ("name", "Ada")])
        .await;

    assert_status(&resp, StatusCode::CREATED);
    assert_eq!(body_json(resp).await, json!({"created": {"name": "Ada"}}));
}
