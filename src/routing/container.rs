//! Named controller registry.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use super::RouteParams;
use crate::core::{Error, Request, Response, Result};

/// A controller exposing named actions.
#[async_trait]
pub trait Controller: Send + Sync {
    /// Run `action`. Unknown actions should return an error.
    async fn call(&self, action: &str, request: Request, params: RouteParams) -> Result<Response>;

    /// Whether [`invoke`](Controller::invoke) is implemented.
    fn is_invokable(&self) -> bool {
        false
    }

    /// Single-action entry point.
    async fn invoke(&self, request: Request, params: RouteParams) -> Result<Response> {
        let _ = (request, params);
        Err(Error::InvalidHandler(
            "Controller does not implement invoke".to_string(),
        ))
    }
}

type Factory = Arc<dyn Fn(&Container) -> Result<Arc<dyn Controller>> + Send + Sync>;

#[derive(Clone)]
enum Binding {
    Shared(Arc<dyn Controller>),
    Factory(Factory),
}

/// Resolves controller names to instances.
#[derive(Clone, Default)]
pub struct Container {
    bindings: HashMap<String, Binding>,
}

impl Container {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a factory run on every resolution.
    pub fn bind<F>(&mut self, name: impl Into<String>, factory: F) -> &mut Self
    where
        F: Fn(&Container) -> Result<Arc<dyn Controller>> + Send + Sync + 'static,
    {
        self.bindings
            .insert(name.into(), Binding::Factory(Arc::new(factory)));
        self
    }

    /// Register a shared instance.
    pub fn instance(&mut self, name: impl Into<String>, controller: Arc<dyn Controller>) -> &mut Self {
        self.bindings.insert(name.into(), Binding::Shared(controller));
        self
    }

    /// Alias of [`instance`](Container::instance).
    pub fn singleton(&mut self, name: impl Into<String>, controller: Arc<dyn Controller>) -> &mut Self {
        self.instance(name, controller)
    }

    pub fn has(&self, name: &str) -> bool {
        self.bindings.contains_key(name)
    }

    /// Resolve a controller by name.
    pub fn get(&self, name: &str) -> Result<Arc<dyn Controller>> {
        match self.bindings.get(name) {
            Some(Binding::Shared(controller)) => Ok(Arc::clone(controller)),
            Some(Binding::Factory(factory)) => factory(self),
            None => Err(Error::NotBound(name.to_string())),
        }
    }
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&String> = self.bindings.keys().collect();
        names.sort();
        f.debug_struct("Container").field("bindings", &names).finish()
    }
}
