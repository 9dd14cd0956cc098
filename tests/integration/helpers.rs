//! Test helpers: an in-process server on an ephemeral port plus a client.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde_json::json;
use tempfile::TempDir;

use careminate::config::ServerConfig;
use careminate::core::{Error, Request, Response as AppResponse, Result};
use careminate::exceptions::{ErrorPages, ExceptionHandler};
use careminate::http::middleware::{AccessLogMiddleware, RequestIdMiddleware};
use careminate::logging::{
    Alert, AlertChannel, AlertError, AlertManager, LogLevel, Logger, LoggerConfig,
};
use careminate::routing::{handler, Container, Controller, RouteParams, Router, Routes};
use careminate::{Kernel, Server};

/// Server options for one test.
#[derive(Default)]
pub struct TestOptions {
    pub debug: bool,
    /// Pages written into the error pages directory as `(status, html)`.
    pub error_pages: Vec<(u16, &'static str)>,
    /// Mount no routes at all.
    pub no_routes: bool,
}

/// Alert channel that keeps what it receives.
#[derive(Default)]
pub struct RecordingChannel {
    pub alerts: Mutex<Vec<Alert>>,
}

#[async_trait]
impl AlertChannel for RecordingChannel {
    fn name(&self) -> &'static str {
        "recording"
    }

    async fn send(&self, alert: &Alert) -> std::result::Result<(), AlertError> {
        self.alerts.lock().unwrap().push(alert.clone());
        Ok(())
    }
}

struct UsersController;

#[async_trait]
impl Controller for UsersController {
    async fn call(&self, action: &str, req: Request, params: RouteParams) -> Result<AppResponse> {
        match action {
            "show" => Ok(AppResponse::json(&json!({"id": params.parse::<u64>("id")}))),
            "store" => Ok(AppResponse::json(&json!({"created": req.all()}))
                .with_status(http::StatusCode::CREATED)),
            "destroy" => Ok(AppResponse::text(format!(
                "deleted {}",
                params.get("id").unwrap_or("")
            ))),
            other => Err(Error::InvalidHandler(format!("no action {}", other))),
        }
    }
}

struct PingController;

#[async_trait]
impl Controller for PingController {
    async fn call(&self, _action: &str, _req: Request, _p: RouteParams) -> Result<AppResponse> {
        Err(Error::InvalidHandler("single action controller".into()))
    }

    fn is_invokable(&self) -> bool {
        true
    }

    async fn invoke(&self, _req: Request, _p: RouteParams) -> Result<AppResponse> {
        Ok(AppResponse::text("pong"))
    }
}

fn routes() -> Routes {
    let mut routes = Routes::new();
    routes
        .get(
            "/",
            handler(|_req, _p| async { Ok(AppResponse::html("<h1>Home</h1>")) }),
        )
        .get(
            "/hello/{name}",
            handler(|_req, p: RouteParams| async move {
                Ok(AppResponse::text(format!("Hello, {}!", p.get("name").unwrap_or(""))))
            }),
        )
        .get("/users/{id:\\d+}", ("UsersController", "show"))
        .post("/users", ("UsersController", "store"))
        .delete("/users/{id:\\d+}", ("UsersController", "destroy"))
        .get(
            "/archive[/{year:\\d{4}}[/{month:\\d{2}}]]",
            handler(|_req, p: RouteParams| async move { Ok(AppResponse::json(&p.to_json())) }),
        )
        .get(
            "/query",
            handler(|req: Request, _p| async move { Ok(AppResponse::json(&json!(req.all()))) }),
        )
        .post(
            "/echo",
            handler(|req: Request, _p| async move {
                Ok(AppResponse::json(&json!({
                    "json": req.is_json(),
                    "input": req.json(),
                })))
            }),
        )
        .post(
            "/upload",
            handler(|req: Request, _p| async move {
                let file = req.file("doc");
                Ok(AppResponse::json(&json!({
                    "title": req.get_str("title"),
                    "name": file.map(|f| f.name.clone()),
                    "size": file.map(|f| f.size),
                    "valid": req.has_file("doc"),
                })))
            }),
        )
        .get(
            "/fail",
            handler(|_req, _p| async { Err(Error::Custom("database exploded".into())) }),
        )
        .get(
            "/secret",
            handler(|_req, _p| async {
                Err(Error::Auth {
                    message: "Token expired".into(),
                    context: json!({"user": 7}),
                })
            }),
        )
        .get("/ping", "PingController")
        .get("/broken", "UsersController")
        .get("/ghost", ("GhostController", "index"));
    routes
}

/// Running server plus everything it writes to disk.
pub struct TestServer {
    pub base_url: String,
    pub client: Client,
    pub server: Arc<Server>,
    pub alerts: Arc<RecordingChannel>,
    pub log_path: PathBuf,
    pub upload_dir: PathBuf,
    _dir: TempDir,
}

#[allow(dead_code)]
impl TestServer {
    pub async fn start() -> Self {
        Self::with_options(TestOptions::default()).await
    }

    pub async fn with_options(opts: TestOptions) -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");

        let mut config = ServerConfig::local(dir.path());
        config.upload_dir = dir.path().join("uploads");
        std::fs::create_dir_all(&config.upload_dir).expect("Failed to create upload dir");

        let alerts = Arc::new(RecordingChannel::default());
        let sender = AlertManager::new(LogLevel::Error)
            .with_channel(alerts.clone())
            .spawn();

        let log_path = config.default_log_path("test");
        let logger = Logger::new(
            LoggerConfig {
                channel: "test".into(),
                path: Some(log_path.clone()),
                ..LoggerConfig::default()
            },
            dir.path(),
            sender,
        )
        .expect("Failed to create logger");

        let mut exceptions = ExceptionHandler::new(Arc::new(logger), opts.debug);
        if !opts.error_pages.is_empty() {
            let pages_dir = dir.path().join("errors");
            std::fs::create_dir_all(&pages_dir).expect("Failed to create pages dir");
            for (status, html) in &opts.error_pages {
                std::fs::write(pages_dir.join(format!("{}.html", status)), html)
                    .expect("Failed to write error page");
            }
            exceptions = exceptions.with_error_pages(ErrorPages::from_directory(&pages_dir));
        }

        let mut container = Container::new();
        container
            .instance("UsersController", Arc::new(UsersController))
            .bind("PingController", |_| Ok(Arc::new(PingController)));

        let router = if opts.no_routes {
            Router::new()
        } else {
            Router::from_routes(routes()).expect("Invalid test routes")
        };

        let kernel = Kernel::new(router, container, exceptions)
            .with_middleware(RequestIdMiddleware::new())
            .with_middleware(AccessLogMiddleware::new());

        let server = Arc::new(
            Server::bind(&config, kernel)
                .await
                .expect("Failed to bind test server"),
        );
        let runner = Arc::clone(&server);
        tokio::spawn(async move { runner.run().await });

        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            base_url: format!("http://{}", server.local_addr()),
            client,
            server,
            alerts,
            log_path,
            upload_dir: config.upload_dir,
            _dir: dir,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn get(&self, path: &str) -> Response {
        self.client
            .get(self.url(path))
            .send()
            .await
            .expect("GET request failed")
    }

    pub async fn get_with_headers(&self, path: &str, headers: &[(&str, &str)]) -> Response {
        let mut req = self.client.get(self.url(path));
        for (name, value) in headers {
            req = req.header(*name, *value);
        }
        req.send().await.expect("GET request failed")
    }

    pub async fn post_form(&self, path: &str, form: &[(&str, &str)]) -> Response {
        self.client
            .post(self.url(path))
            .form(form)
            .send()
            .await
            .expect("POST request failed")
    }

    pub async fn post_json<T: serde::Serialize + ?Sized>(&self, path: &str, json: &T) -> Response {
        self.client
            .post(self.url(path))
            .json(json)
            .send()
            .await
            .expect("POST request failed")
    }

    pub fn log_contents(&self) -> String {
        std::fs::read_to_string(&self.log_path).unwrap_or_default()
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.server.trigger_shutdown();
    }
}

pub fn assert_status(resp: &Response, expected: StatusCode) {
    assert_eq!(
        resp.status(),
        expected,
        "Expected status {}, got {}",
        expected,
        resp.status()
    );
}

pub fn assert_header(resp: &Response, name: &str, expected: &str) {
    let value = resp
        .headers()
        .get(name)
        .unwrap_or_else(|| panic!("Missing header {}", name))
        .to_str()
        .unwrap();
    assert_eq!(value, expected, "Header {} mismatch", name);
}

pub async fn body_json(resp: Response) -> serde_json::Value {
    resp.json().await.expect("Response is not JSON")
}
