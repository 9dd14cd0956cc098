//! Request kernel: middleware, dispatch, and error conversion.

use std::sync::Arc;

use http::header::HeaderName;
use http::HeaderValue;

use super::middleware::{Middleware, MiddlewareChain, MiddlewareResult};
use crate::core::{Context, Request, Response};
use crate::exceptions::{ErrorFormat, ExceptionHandler};
use crate::routing::{Container, RouteDispatcher};

/// Body served while no routes are registered.
const WELCOME_PAGE: &str = "<h1>Hello World</h1>";

/// Turns a [`Request`] into a [`Response`]. Never fails: errors are
/// reported and rendered by the [`ExceptionHandler`].
pub struct Kernel {
    router: Arc<dyn RouteDispatcher>,
    container: Arc<Container>,
    middleware: MiddlewareChain,
    exceptions: ExceptionHandler,
}

impl Kernel {
    pub fn new(
        router: impl RouteDispatcher + 'static,
        container: Container,
        exceptions: ExceptionHandler,
    ) -> Self {
        Self {
            router: Arc::new(router),
            container: Arc::new(container),
            middleware: MiddlewareChain::new(),
            exceptions,
        }
    }

    pub fn with_middleware<M: Middleware + 'static>(mut self, middleware: M) -> Self {
        self.middleware = self.middleware.add(middleware);
        self
    }

    pub fn with_middleware_chain(mut self, chain: MiddlewareChain) -> Self {
        self.middleware = chain;
        self
    }

    pub fn middleware(&self) -> &MiddlewareChain {
        &self.middleware
    }

    pub fn exceptions(&self) -> &ExceptionHandler {
        &self.exceptions
    }

    /// Run the full request cycle.
    pub async fn handle(&self, request: Request) -> Response {
        let mut ctx = Context::new(request.ip());

        let response = match self.middleware.process_request(request, &mut ctx) {
            MiddlewareResult::Next(request) => self.dispatch(request, &ctx).await,
            MiddlewareResult::Stop(response) => response,
        };

        let response = apply_context_headers(response, &ctx);
        self.middleware.process_response(response, &ctx)
    }

    async fn dispatch(&self, request: Request, ctx: &Context) -> Response {
        if self.router.is_empty() {
            return Response::html(WELCOME_PAGE);
        }

        let format = ErrorFormat::negotiate(&request);

        let result = match self.router.dispatch(&request, &self.container) {
            Ok(dispatched) => {
                tracing::debug!(
                    route = dispatched.route.as_deref().unwrap_or("-"),
                    request_id = %ctx.request_id,
                    "Route matched"
                );
                dispatched.run(request).await
            }
            Err(e) => Err(e),
        };

        match result {
            Ok(response) => response,
            Err(error) => {
                self.exceptions.report(&error, &ctx.request_id);
                self.exceptions.render(&error, format)
            }
        }
    }
}

fn apply_context_headers(mut response: Response, ctx: &Context) -> Response {
    for (name, value) in ctx.response_headers() {
        if let (Ok(name), Ok(value)) = (
            HeaderName::try_from(name.as_str()),
            HeaderValue::try_from(value.as_str()),
        ) {
            response.headers_mut().insert(name, value);
        }
    }
    response
}
