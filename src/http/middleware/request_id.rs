//! `X-Request-ID` propagation.

use super::{Middleware, MiddlewareResult};
use crate::core::{Context, Request, Response};

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Longest client-supplied id that is accepted.
const MAX_ID_LEN: usize = 128;

/// Adopts a well-formed incoming `X-Request-ID` as the context id and echoes
/// the id on every response. Malformed ids are replaced by the generated one.
#[derive(Debug, Default)]
pub struct RequestIdMiddleware;

impl RequestIdMiddleware {
    pub fn new() -> Self {
        Self
    }
}

fn is_valid_id(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= MAX_ID_LEN
        && id
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.'))
}

impl Middleware for RequestIdMiddleware {
    fn name(&self) -> &'static str {
        "request_id"
    }

    fn priority(&self) -> i32 {
        -100
    }

    fn on_request(&self, req: Request, ctx: &mut Context) -> MiddlewareResult {
        if let Some(id) = req.header(REQUEST_ID_HEADER).map(str::trim) {
            if is_valid_id(id) {
                ctx.request_id = id.to_string();
            }
        }
        MiddlewareResult::Next(req)
    }

    fn on_response(&self, res: Response, ctx: &Context) -> Response {
        res.with_header(REQUEST_ID_HEADER, &ctx.request_id)
    }
}
