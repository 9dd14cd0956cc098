//! careminate - a small MVC web framework on hyper and tokio.
//!
//! # Features
//!
//! - **Routing**: FastRoute-style patterns with typed placeholders and
//!   nested optional segments, closures or container-resolved controllers
//! - **Middleware Pipeline**: Composable request/response middleware
//! - **Exception Rendering**: JSON, debug, or custom error pages per client
//! - **Application Logging**: Channel files with daily rotation, stderr or
//!   syslog, and email/Slack alerts above a severity threshold
//! - **Helpers**: Dot-notation JSON access, string helpers, debug dumps
//!
//! # Example
//!
//! ```rust,ignore
//! use careminate::core::Response;
//! use careminate::routing::{handler, Container, Router, Routes};
//!
//! let mut routes = Routes::new();
//! routes.get("/", handler(|_req, _params| async { Ok(Response::html("<h1>Home</h1>")) }));
//!
//! let kernel = Kernel::new(Router::from_routes(routes)?, Container::new(), exceptions);
//! let server = Server::bind(&config.server, kernel).await?;
//! server.run().await?;
//! ```

/// Package version from Cargo.toml
pub const PKG_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Git commit hash (8 chars) with optional "-dirty" suffix
pub const BUILD_VERSION: &str = env!("BUILD_VERSION");

/// Full version string: "0.1.0 (abc12345)" or "0.1.0 (abc12345-dirty)"
pub const VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), " (", env!("BUILD_VERSION"), ")");

pub mod config;
pub mod core;
pub mod exceptions;
pub mod http;
pub mod logging;
pub mod routing;
pub mod server;
pub mod support;

// Re-exports for convenience
pub use self::config::Config;
pub use self::http::Kernel;
pub use self::server::Server;
