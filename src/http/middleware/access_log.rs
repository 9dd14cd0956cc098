//! Access logging middleware.
//!
//! Emits one `tracing` event per request with target `access`, so the JSON
//! formatter tags it as `"type": "access"`.

use super::{Middleware, MiddlewareResult};
use crate::core::{Context, Request, Response};

/// Request fields captured in `on_request` for the log line.
struct AccessInfo {
    method: String,
    path: String,
    query: Option<String>,
    ua: Option<String>,
    referer: Option<String>,
}

const INFO_KEY: &str = "access_log";

/// Logs method, path, status, size and duration of every request.
pub struct AccessLogMiddleware {
    enabled: bool,
}

impl AccessLogMiddleware {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_enabled(enabled: bool) -> Self {
        Self { enabled }
    }
}

impl Default for AccessLogMiddleware {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl Middleware for AccessLogMiddleware {
    fn name(&self) -> &'static str {
        "access_log"
    }

    fn priority(&self) -> i32 {
        -90
    }

    fn on_request(&self, req: Request, ctx: &mut Context) -> MiddlewareResult {
        if self.enabled {
            ctx.set(
                INFO_KEY,
                AccessInfo {
                    method: req.method().to_string(),
                    path: req.path().to_string(),
                    query: req.query_string().map(str::to_string),
                    ua: req.user_agent().map(str::to_string),
                    referer: req.header("referer").map(str::to_string),
                },
            );
        }
        MiddlewareResult::Next(req)
    }

    fn on_response(&self, res: Response, ctx: &Context) -> Response {
        if !self.enabled {
            return res;
        }

        // Requests stopped before this middleware ran have no info
        let Some(info) = ctx.get::<AccessInfo>(INFO_KEY) else {
            return res;
        };

        tracing::info!(
            target: "access",
            method = %info.method,
            path = %info.path,
            query = info.query.as_deref(),
            status = res.status().as_u16(),
            bytes = res.body_len() as u64,
            duration_ms = ctx.elapsed_ms(),
            ip = %ctx.client_ip,
            ua = info.ua.as_deref(),
            referer = info.referer.as_deref(),
            request_id = %ctx.request_id,
            "{} {} {}",
            info.method,
            info.path,
            res.status().as_u16()
        );

        res
    }
}
