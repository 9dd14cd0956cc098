//! Route registration.
//!
//! ```rust,ignore
//! let mut routes = Routes::new();
//! routes
//!     .get("/", handler(|_req, _params| async { Ok(Response::html("<h1>Home</h1>")) }))
//!     .get("/users/{id:\\d+}", ("UserController", "show"))
//!     .post("/webhooks/stripe", "StripeWebhook");
//! ```

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures_util::future::BoxFuture;
use http::Method;
use serde_json::{Map, Value};

use crate::core::{Request, Response, Result};

/// Placeholder values captured from the path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteParams {
    values: Vec<(String, String)>,
}

impl RouteParams {
    pub fn new(values: Vec<(String, String)>) -> Self {
        Self { values }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Parse a captured value, `None` when missing or malformed.
    pub fn parse<T: std::str::FromStr>(&self, name: &str) -> Option<T> {
        self.get(name).and_then(|v| v.parse().ok())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn to_json(&self) -> Value {
        Value::Object(
            self.values
                .iter()
                .map(|(k, v)| (k.clone(), Value::String(v.clone())))
                .collect::<Map<_, _>>(),
        )
    }
}

/// An async function usable as a route action.
pub trait Handler: Send + Sync {
    fn call(&self, request: Request, params: RouteParams) -> BoxFuture<'static, Result<Response>>;
}

impl<F, Fut> Handler for F
where
    F: Fn(Request, RouteParams) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Response>> + Send + 'static,
{
    fn call(&self, request: Request, params: RouteParams) -> BoxFuture<'static, Result<Response>> {
        Box::pin((self)(request, params))
    }
}

/// What a route runs when it matches.
#[derive(Clone)]
pub enum RouteAction {
    /// An inline async function.
    Closure(Arc<dyn Handler>),
    /// A named action on a container-resolved controller.
    Controller { controller: String, action: String },
    /// A single-action controller, run through its `invoke` entry point.
    Invokable(String),
}

impl RouteAction {
    /// Label for diagnostics, e.g. `UserController@show`.
    pub fn describe(&self) -> String {
        match self {
            RouteAction::Closure(_) => "Closure".to_string(),
            RouteAction::Controller { controller, action } => format!("{}@{}", controller, action),
            RouteAction::Invokable(controller) => controller.clone(),
        }
    }
}

impl fmt::Debug for RouteAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.describe())
    }
}

/// Wrap an async function as a route action.
pub fn handler<F, Fut>(f: F) -> RouteAction
where
    F: Fn(Request, RouteParams) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Response>> + Send + 'static,
{
    RouteAction::Closure(Arc::new(f))
}

impl From<(&str, &str)> for RouteAction {
    fn from((controller, action): (&str, &str)) -> Self {
        RouteAction::Controller {
            controller: controller.to_string(),
            action: action.to_string(),
        }
    }
}

impl From<&str> for RouteAction {
    fn from(controller: &str) -> Self {
        RouteAction::Invokable(controller.to_string())
    }
}

impl From<String> for RouteAction {
    fn from(controller: String) -> Self {
        RouteAction::Invokable(controller)
    }
}

/// One registered route.
#[derive(Debug, Clone)]
pub struct Route {
    pub method: Method,
    pub path: String,
    pub action: RouteAction,
}

/// Ordered route table.
#[derive(Debug, Clone, Default)]
pub struct Routes {
    routes: Vec<Route>,
}

impl Routes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&mut self, path: &str, action: impl Into<RouteAction>) -> &mut Self {
        self.add(Method::GET, path, action)
    }

    pub fn post(&mut self, path: &str, action: impl Into<RouteAction>) -> &mut Self {
        self.add(Method::POST, path, action)
    }

    pub fn put(&mut self, path: &str, action: impl Into<RouteAction>) -> &mut Self {
        self.add(Method::PUT, path, action)
    }

    pub fn patch(&mut self, path: &str, action: impl Into<RouteAction>) -> &mut Self {
        self.add(Method::PATCH, path, action)
    }

    pub fn delete(&mut self, path: &str, action: impl Into<RouteAction>) -> &mut Self {
        self.add(Method::DELETE, path, action)
    }

    /// Register for any method, e.g. OPTIONS.
    pub fn add(&mut self, method: Method, path: &str, action: impl Into<RouteAction>) -> &mut Self {
        self.routes.push(Route {
            method,
            path: path.to_string(),
            action: action.into(),
        });
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = &Route> {
        self.routes.iter()
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

impl IntoIterator for Routes {
    type Item = Route;
    type IntoIter = std::vec::IntoIter<Route>;

    fn into_iter(self) -> Self::IntoIter {
        self.routes.into_iter()
    }
}
