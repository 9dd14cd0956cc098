//! Routing: pattern registration, table compilation, and dispatch.
//!
//! - [`Routes`] - ordered list of `(method, pattern, action)` registrations
//! - [`Router`] - compiled table; implements [`RouteDispatcher`]
//! - [`Container`] - resolves controller names used by route actions
//!
//! # Example
//!
//! ```rust,ignore
//! use careminate::routing::{handler, Container, Router, Routes};
//!
//! let mut routes = Routes::new();
//! routes.get("/hello/{name}", handler(|_req, params| async move {
//!     Ok(Response::text(format!("Hello {}", params.get("name").unwrap_or(""))))
//! }));
//! let router = Router::from_routes(routes)?;
//! ```

mod container;
pub mod pattern;
mod route;
mod router;

pub use container::{Container, Controller};
pub use route::{handler, Handler, Route, RouteAction, RouteParams, Routes};
pub use router::{Dispatched, RouteDispatcher, RouteMatch, Router, Target};
