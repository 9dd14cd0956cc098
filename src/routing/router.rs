//! Route table compilation and dispatch.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use http::Method;
use percent_encoding::percent_decode_str;

use super::container::{Container, Controller};
use super::pattern::{self, CompiledVariant};
use super::route::{Handler, Route, RouteAction, RouteParams, Routes};
use crate::core::{Error, Request, Response, Result};

/// Path answered with an empty 204 without touching the route table.
const FAVICON_PATH: &str = "/favicon.ico";

/// Something that can turn a request into a runnable target.
pub trait RouteDispatcher: Send + Sync {
    /// Match the request and resolve its action through `container`.
    fn dispatch(&self, request: &Request, container: &Container) -> Result<Dispatched>;

    /// True when no routes are registered.
    fn is_empty(&self) -> bool;
}

/// A resolved, ready-to-run route action.
pub enum Target {
    Handler(Arc<dyn Handler>),
    Action {
        controller: Arc<dyn Controller>,
        action: String,
    },
    Invoke(Arc<dyn Controller>),
    /// Empty 204 response.
    NoContent,
}

impl fmt::Debug for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Handler(_) => f.write_str("Handler"),
            Target::Action { action, .. } => write!(f, "Action({})", action),
            Target::Invoke(_) => f.write_str("Invoke"),
            Target::NoContent => f.write_str("NoContent"),
        }
    }
}

/// Outcome of a successful dispatch.
#[derive(Debug)]
pub struct Dispatched {
    pub target: Target,
    pub params: RouteParams,
    /// Pattern of the matched route, if any.
    pub route: Option<String>,
}

impl Dispatched {
    /// Run the target.
    pub async fn run(self, request: Request) -> Result<Response> {
        match self.target {
            Target::Handler(handler) => handler.call(request, self.params).await,
            Target::Action { controller, action } => {
                controller.call(&action, request, self.params).await
            }
            Target::Invoke(controller) => controller.invoke(request, self.params).await,
            Target::NoContent => Ok(Response::no_content()),
        }
    }
}

/// Raw match result before action resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteMatch {
    Found { index: usize, params: RouteParams },
    MethodNotAllowed(Vec<Method>),
    NotFound,
}

#[derive(Debug, Default)]
struct MethodTable {
    statics: HashMap<String, usize>,
    variables: Vec<(CompiledVariant, usize)>,
}

impl MethodTable {
    fn find(&self, path: &str) -> Option<(usize, RouteParams)> {
        if let Some(&index) = self.statics.get(path) {
            return Some((index, RouteParams::default()));
        }

        self.variables.iter().find_map(|(variant, index)| {
            variant.captures(path).map(|captures| {
                let decoded = captures
                    .into_iter()
                    .map(|(k, v)| (k, percent_decode_str(&v).decode_utf8_lossy().into_owned()))
                    .collect();
                (*index, RouteParams::new(decoded))
            })
        })
    }

    fn matches(&self, path: &str) -> bool {
        self.statics.contains_key(path) || self.variables.iter().any(|(v, _)| v.is_match(path))
    }
}

/// Compiled route table.
#[derive(Debug, Default)]
pub struct Router {
    routes: Vec<Route>,
    // Kept in first-registration order so `Allow` lists are stable
    tables: Vec<(Method, MethodTable)>,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compile a route table.
    pub fn from_routes(routes: Routes) -> Result<Self> {
        let mut router = Self::new();
        router.set_routes(routes)?;
        Ok(router)
    }

    /// Replace the route table. On error the previous table is kept.
    pub fn set_routes(&mut self, routes: Routes) -> Result<()> {
        let mut compiled = Router::new();
        for route in routes {
            compiled.add_route(route)?;
        }
        *self = compiled;
        Ok(())
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    fn add_route(&mut self, route: Route) -> Result<()> {
        let index = self.routes.len();
        let variants = pattern::parse(&route.path)?;
        let method = route.method.clone();
        let table = self.table_mut(&method);

        for variant in variants {
            match variant.as_static() {
                Some(path) => {
                    if table.statics.contains_key(&path) {
                        return Err(Error::RouteDefinition(format!(
                            "Cannot register two routes matching \"{}\" for method \"{}\"",
                            path, method
                        )));
                    }
                    if let Some((shadow, _)) = table.variables.iter().find(|(v, _)| v.is_match(&path)) {
                        return Err(Error::RouteDefinition(format!(
                            "Static route \"{}\" is shadowed by previously defined variable route \"{}\" for method \"{}\"",
                            path,
                            shadow.source(),
                            method
                        )));
                    }
                    table.statics.insert(path, index);
                }
                None => {
                    let compiled = variant.compile()?;
                    if table.variables.iter().any(|(v, _)| v.source() == compiled.source()) {
                        return Err(Error::RouteDefinition(format!(
                            "Cannot register two routes matching \"{}\" for method \"{}\"",
                            compiled.source(),
                            method
                        )));
                    }
                    table.variables.push((compiled, index));
                }
            }
        }

        self.routes.push(route);
        Ok(())
    }

    fn table_mut(&mut self, method: &Method) -> &mut MethodTable {
        let pos = match self.tables.iter().position(|(m, _)| m == method) {
            Some(pos) => pos,
            None => {
                self.tables.push((method.clone(), MethodTable::default()));
                self.tables.len() - 1
            }
        };
        &mut self.tables[pos].1
    }

    fn table(&self, method: &Method) -> Option<&MethodTable> {
        self.tables
            .iter()
            .find(|(m, _)| m == method)
            .map(|(_, t)| t)
    }

    /// Match `method` and `path` against the table. HEAD falls back to GET.
    pub fn match_route(&self, method: &Method, path: &str) -> RouteMatch {
        let found = self
            .table(method)
            .and_then(|t| t.find(path))
            .or_else(|| {
                if *method == Method::HEAD {
                    self.table(&Method::GET).and_then(|t| t.find(path))
                } else {
                    None
                }
            });

        if let Some((index, params)) = found {
            return RouteMatch::Found { index, params };
        }

        let allowed: Vec<Method> = self
            .tables
            .iter()
            .filter(|(m, table)| m != method && table.matches(path))
            .map(|(m, _)| m.clone())
            .collect();

        if allowed.is_empty() {
            RouteMatch::NotFound
        } else {
            RouteMatch::MethodNotAllowed(allowed)
        }
    }

    fn resolve(&self, action: &RouteAction, container: &Container) -> Result<Target> {
        match action {
            RouteAction::Closure(handler) => Ok(Target::Handler(Arc::clone(handler))),
            RouteAction::Controller { controller, action } => Ok(Target::Action {
                controller: container.get(controller)?,
                action: action.clone(),
            }),
            RouteAction::Invokable(name) => {
                let controller = container.get(name)?;
                if !controller.is_invokable() {
                    return Err(Error::InvalidHandler(format!(
                        "Handler class {} must implement invoke",
                        name
                    )));
                }
                Ok(Target::Invoke(controller))
            }
        }
    }
}

impl RouteDispatcher for Router {
    fn dispatch(&self, request: &Request, container: &Container) -> Result<Dispatched> {
        let path = request.path_info();

        if path == FAVICON_PATH {
            return Ok(Dispatched {
                target: Target::NoContent,
                params: RouteParams::default(),
                route: None,
            });
        }

        match self.match_route(&request.method(), path) {
            RouteMatch::Found { index, params } => {
                let route = self
                    .routes
                    .get(index)
                    .ok_or_else(|| Error::InvalidHandler("Invalid route handler definition.".into()))?;
                Ok(Dispatched {
                    target: self.resolve(&route.action, container)?,
                    params,
                    route: Some(route.path.clone()),
                })
            }
            RouteMatch::MethodNotAllowed(allowed) => Err(Error::MethodNotAllowed { allowed }),
            RouteMatch::NotFound => Err(Error::not_found()),
        }
    }

    fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::route::handler;
    use async_trait::async_trait;
    use bytes::Bytes;
    use http::{HeaderMap, StatusCode};

    fn ok(body: &'static str) -> RouteAction {
        handler(move |_req, _p| async move { Ok(Response::text(body)) })
    }

    fn request(method: Method, path: &str) -> Request {
        Request::new(method, path.parse().unwrap(), HeaderMap::new(), Bytes::new())
    }

    struct Users;

    #[async_trait]
    impl Controller for Users {
        async fn call(&self, action: &str, _req: Request, params: RouteParams) -> Result<Response> {
            match action {
                "show" => Ok(Response::text(format!("user {}", params.get("id").unwrap_or("")))),
                other => Err(Error::InvalidHandler(format!("no action {}", other))),
            }
        }
    }

    struct Ping;

    #[async_trait]
    impl Controller for Ping {
        async fn call(&self, _action: &str, _req: Request, _p: RouteParams) -> Result<Response> {
            Err(Error::InvalidHandler("single action".into()))
        }

        fn is_invokable(&self) -> bool {
            true
        }

        async fn invoke(&self, _req: Request, _p: RouteParams) -> Result<Response> {
            Ok(Response::text("pong"))
        }
    }

    fn container() -> Container {
        let mut c = Container::new();
        c.instance("Users", Arc::new(Users));
        c.instance("Ping", Arc::new(Ping));
        c
    }

    #[test]
    fn test_static_and_variable_matching() {
        let mut routes = Routes::new();
        routes
            .get("/users", ok("list"))
            .get("/users/{id:\\d+}", ok("show"))
            .post("/users", ok("store"));
        let router = Router::from_routes(routes).unwrap();

        assert!(matches!(router.match_route(&Method::GET, "/users"), RouteMatch::Found { index: 0, .. }));
        match router.match_route(&Method::GET, "/users/5") {
            RouteMatch::Found { index, params } => {
                assert_eq!(index, 1);
                assert_eq!(params.get("id"), Some("5"));
            }
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(router.match_route(&Method::GET, "/users/abc"), RouteMatch::NotFound);
    }

    #[test]
    fn test_method_not_allowed_lists_methods() {
        let mut routes = Routes::new();
        routes
            .get("/items", ok("a"))
            .post("/items", ok("b"))
            .put("/items/{id}", ok("c"));
        let router = Router::from_routes(routes).unwrap();

        assert_eq!(
            router.match_route(&Method::DELETE, "/items"),
            RouteMatch::MethodNotAllowed(vec![Method::GET, Method::POST])
        );

        let err = router
            .dispatch(&request(Method::DELETE, "/items"), &Container::new())
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(err.to_string(), "The allowed methods are GET, POST");
    }

    #[test]
    fn test_head_falls_back_to_get() {
        let mut routes = Routes::new();
        routes.get("/page", ok("page"));
        let router = Router::from_routes(routes).unwrap();
        assert!(matches!(router.match_route(&Method::HEAD, "/page"), RouteMatch::Found { .. }));
    }

    #[test]
    fn test_optional_segments_register_each_variant() {
        let mut routes = Routes::new();
        routes.get("/archive[/{year:\\d{4}}[/{month:\\d{2}}]]", ok("archive"));
        let router = Router::from_routes(routes).unwrap();

        assert!(matches!(router.match_route(&Method::GET, "/archive"), RouteMatch::Found { .. }));
        assert!(matches!(router.match_route(&Method::GET, "/archive/2024"), RouteMatch::Found { .. }));
        match router.match_route(&Method::GET, "/archive/2024/05") {
            RouteMatch::Found { params, .. } => assert_eq!(params.get("month"), Some("05")),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_definition_errors() {
        let mut routes = Routes::new();
        routes.get("/a", ok("1")).get("/a", ok("2"));
        let err = Router::from_routes(routes).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Cannot register two routes matching \"/a\" for method \"GET\""
        );

        let mut routes = Routes::new();
        routes.get("/u/{name}", ok("1")).get("/u/me", ok("2"));
        let err = Router::from_routes(routes).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Static route \"/u/me\" is shadowed by previously defined variable route \"/u/([^/]+)\" for method \"GET\""
        );

        let mut routes = Routes::new();
        routes.get("/u/{a}", ok("1")).get("/u/{b}", ok("2"));
        assert!(Router::from_routes(routes).is_err());

        // Same path under another method is fine
        let mut routes = Routes::new();
        routes.get("/a", ok("1")).post("/a", ok("2"));
        assert!(Router::from_routes(routes).is_ok());
    }

    #[test]
    fn test_set_routes_keeps_old_table_on_error() {
        let mut routes = Routes::new();
        routes.get("/ok", ok("1"));
        let mut router = Router::from_routes(routes).unwrap();

        let mut bad = Routes::new();
        bad.get("/x[", ok("1"));
        assert!(router.set_routes(bad).is_err());
        assert_eq!(router.routes().len(), 1);
    }

    #[tokio::test]
    async fn test_dispatch_resolves_actions() {
        let mut routes = Routes::new();
        routes
            .get("/users/{id}", ("Users", "show"))
            .get("/ping", "Ping")
            .get("/broken", "Users")
            .get("/ghost", ("Ghost", "index"));
        let router = Router::from_routes(routes).unwrap();
        let container = container();

        let dispatched = router.dispatch(&request(Method::GET, "/users/ada%20l"), &container).unwrap();
        assert_eq!(dispatched.route.as_deref(), Some("/users/{id}"));
        let res = dispatched.run(request(Method::GET, "/users/ada%20l")).await.unwrap();
        assert_eq!(res.body().as_ref(), b"user ada l");

        let res = router
            .dispatch(&request(Method::GET, "/ping/"), &container)
            .unwrap()
            .run(request(Method::GET, "/ping/"))
            .await
            .unwrap();
        assert_eq!(res.body().as_ref(), b"pong");

        let err = router.dispatch(&request(Method::GET, "/broken"), &container).unwrap_err();
        assert_eq!(err.to_string(), "Handler class Users must implement invoke");

        let err = router.dispatch(&request(Method::GET, "/ghost"), &container).unwrap_err();
        assert!(matches!(err, Error::NotBound(_)));

        let err = router.dispatch(&request(Method::GET, "/nowhere"), &container).unwrap_err();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert_eq!(err.to_string(), "Not found");
    }

    #[tokio::test]
    async fn test_favicon_short_circuits() {
        let router = Router::new();
        let dispatched = router
            .dispatch(&request(Method::GET, "/favicon.ico"), &Container::new())
            .unwrap();
        let res = dispatched.run(request(Method::GET, "/favicon.ico")).await.unwrap();
        assert_eq!(res.status(), StatusCode::NO_CONTENT);
        assert!(res.body().is_empty());
        assert!(router.is_empty());
    }
}
