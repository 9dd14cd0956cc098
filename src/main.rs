use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use tracing::info;

use careminate::config::{Config, Repository};
use careminate::core::{Error, Request, Response, Result};
use careminate::exceptions::{ErrorPages, ExceptionHandler};
use careminate::http::middleware::{AccessLogMiddleware, RequestIdMiddleware};
use careminate::logging::{init_tracing, AlertManager, AlertsConfig, Logger, LoggerConfig};
use careminate::routing::{handler, Container, Controller, RouteParams, Router, Routes};
use careminate::support::dd;
use careminate::{Kernel, Server, VERSION};

/// Demo controller with named actions.
struct UserController;

#[async_trait]
impl Controller for UserController {
    async fn call(&self, action: &str, req: Request, params: RouteParams) -> Result<Response> {
        match action {
            "show" => {
                let id: u64 = params.parse("id").ok_or_else(Error::not_found)?;
                Ok(Response::json(&json!({"id": id, "ip": req.ip()})))
            }
            "store" => Ok(Response::json(&json!({"created": req.all()}))
                .with_status(http::StatusCode::CREATED)),
            other => Err(Error::InvalidHandler(format!(
                "Action {} not found on UserController",
                other
            ))),
        }
    }
}

/// Demo single-action controller.
struct HealthController;

#[async_trait]
impl Controller for HealthController {
    async fn call(&self, _action: &str, req: Request, params: RouteParams) -> Result<Response> {
        self.invoke(req, params).await
    }

    fn is_invokable(&self) -> bool {
        true
    }

    async fn invoke(&self, _req: Request, _params: RouteParams) -> Result<Response> {
        Ok(Response::json(&json!({"status": "ok", "version": VERSION})))
    }
}

fn routes() -> Routes {
    let mut routes = Routes::new();
    routes
        .get(
            "/",
            handler(|_req, _p| async { Ok(Response::html("<h1>Hello World</h1>")) }),
        )
        .get(
            "/hello/{name}",
            handler(|_req, p: RouteParams| async move {
                let name = careminate::support::escape_html(p.get("name").unwrap_or(""));
                Ok(Response::html(format!("<h1>Hello {}</h1>", name)))
            }),
        )
        .get("/users/{id:\\d+}", ("UserController", "show"))
        .post("/users", ("UserController", "store"))
        .get("/health", "HealthController")
        .get(
            "/debug/request",
            handler(|req: Request, p: RouteParams| async move {
                Ok(dd(&[json!(req.all()), p.to_json()]))
            }),
        );
    routes
}

fn main() -> std::result::Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let config = Config::from_env()?;
    init_tracing(&config.logging);

    info!("Starting careminate {}", VERSION);
    config.log_summary();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async_main(config))
}

async fn async_main(config: Config) -> std::result::Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let repo = Repository::load(&config.server.config_dir)?;

    // Alerts need the runtime for their dispatcher task
    let alerts_config: AlertsConfig = repo.section("logging.alerts")?;
    let alerts = AlertManager::from_config(&alerts_config)?.spawn();

    let mut logger_config: LoggerConfig = repo.section("logging")?;
    logger_config.path = Some(match logger_config.path.take() {
        Some(path) if path.is_relative() => config.server.base_path.join(path),
        Some(path) => path,
        None => config.server.default_log_path(&logger_config.channel),
    });
    let logger = Arc::new(Logger::new(logger_config, &config.server.base_path, alerts)?);

    let mut exceptions = ExceptionHandler::new(Arc::clone(&logger), config.server.debug);
    if let Some(dir) = &config.server.error_pages_dir {
        exceptions = exceptions.with_error_pages(ErrorPages::from_directory(dir));
    }

    let mut container = Container::new();
    container
        .singleton("UserController", Arc::new(UserController))
        .bind("HealthController", |_| Ok(Arc::new(HealthController)));

    let kernel = Kernel::new(Router::from_routes(routes())?, container, exceptions)
        .with_middleware(RequestIdMiddleware::new())
        .with_middleware(AccessLogMiddleware::with_enabled(config.server.access_log));

    let server = Arc::new(Server::bind(&config.server, kernel).await?);
    logger.info(
        "Server started",
        Some(&json!({"addr": server.local_addr().to_string(), "version": VERSION})),
    );

    let runner = Arc::clone(&server);
    let accept_loop = tokio::spawn(async move { runner.run().await });

    tokio::signal::ctrl_c().await?;
    info!("Received Ctrl+C, initiating graceful shutdown...");

    server.trigger_shutdown();
    if let Ok(Err(e)) = accept_loop.await {
        tracing::error!("Accept loop failed: {}", e);
    }

    if server.wait_for_drain(server.drain_timeout()).await {
        info!("All connections drained");
    }

    logger.info("Server stopped", None);
    Ok(())
}
