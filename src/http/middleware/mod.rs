//! Request/response middleware.
//!
//! Middleware runs around the router: `on_request` in priority order before
//! dispatch, `on_response` in reverse order after it.
//!
//! ```text
//! Request → MW1.on_request → MW2.on_request → Router
//!                                               ↓
//! Response ← MW1.on_response ← MW2.on_response ←┘
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use careminate::http::middleware::{Middleware, MiddlewareResult};
//!
//! struct Maintenance;
//!
//! impl Middleware for Maintenance {
//!     fn name(&self) -> &'static str { "maintenance" }
//!
//!     fn on_request(&self, _req: Request, _ctx: &mut Context) -> MiddlewareResult {
//!         MiddlewareResult::Stop(Response::text("Back soon").with_status(StatusCode::SERVICE_UNAVAILABLE))
//!     }
//! }
//! ```

mod chain;

pub mod access_log;
pub mod request_id;

pub use access_log::AccessLogMiddleware;
pub use chain::MiddlewareChain;
pub use request_id::RequestIdMiddleware;

use crate::core::{Context, Request, Response};

/// Result of middleware request processing.
#[derive(Debug)]
pub enum MiddlewareResult {
    /// Continue with the (possibly modified) request.
    Next(Request),
    /// Stop the chain and answer with this response.
    Stop(Response),
}

impl MiddlewareResult {
    pub fn is_next(&self) -> bool {
        matches!(self, MiddlewareResult::Next(_))
    }

    pub fn is_stop(&self) -> bool {
        matches!(self, MiddlewareResult::Stop(_))
    }
}

/// A request/response hook.
pub trait Middleware: Send + Sync {
    /// Name used in logs.
    fn name(&self) -> &'static str;

    /// Lower values run first for requests and last for responses.
    ///
    /// Suggested ranges:
    /// - -100..-50: request identity and logging
    /// - -50..50: request checks and rewriting
    /// - 50..100: response decoration
    fn priority(&self) -> i32 {
        0
    }

    fn on_request(&self, req: Request, _ctx: &mut Context) -> MiddlewareResult {
        MiddlewareResult::Next(req)
    }

    fn on_response(&self, res: Response, _ctx: &Context) -> Response {
        res
    }
}
