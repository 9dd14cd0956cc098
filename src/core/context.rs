//! Request context for the middleware pipeline.

use std::any::Any;
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Request-scoped data shared by middleware and the kernel.
pub struct Context {
    /// Correlation id (from `X-Request-ID` or generated).
    pub request_id: String,

    /// Client IP as resolved by the request.
    pub client_ip: String,

    /// Request start time.
    pub started_at: Instant,

    /// Headers appended to the final response.
    response_headers: HashMap<String, String>,

    /// Custom key-value storage for middleware.
    values: HashMap<String, Box<dyn Any + Send + Sync>>,
}

impl Context {
    /// Create a context with a fresh request id.
    pub fn new(client_ip: impl Into<String>) -> Self {
        Self::with_request_id(client_ip, generate_request_id())
    }

    /// Create a context with a known request id.
    pub fn with_request_id(client_ip: impl Into<String>, request_id: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
            client_ip: client_ip.into(),
            started_at: Instant::now(),
            response_headers: HashMap::with_capacity(2),
            values: HashMap::new(),
        }
    }

    /// Set a custom value.
    #[inline]
    pub fn set<T: Send + Sync + 'static>(&mut self, key: &str, value: T) {
        self.values.insert(key.to_string(), Box::new(value));
    }

    /// Get a custom value.
    #[inline]
    pub fn get<T: 'static>(&self, key: &str) -> Option<&T> {
        self.values.get(key).and_then(|v| v.downcast_ref())
    }

    /// Remove a custom value.
    #[inline]
    pub fn remove<T: 'static>(&mut self, key: &str) -> Option<T> {
        self.values
            .remove(key)
            .and_then(|v| v.downcast().ok())
            .map(|b| *b)
    }

    /// Add a response header.
    #[inline]
    pub fn set_response_header(&mut self, name: impl Into<String>, value: impl ToString) {
        self.response_headers.insert(name.into(), value.to_string());
    }

    /// Get all response headers to add.
    #[inline]
    pub fn response_headers(&self) -> &HashMap<String, String> {
        &self.response_headers
    }

    /// Get elapsed time since request started.
    #[inline]
    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Get elapsed time in milliseconds.
    #[inline]
    pub fn elapsed_ms(&self) -> f64 {
        self.elapsed().as_secs_f64() * 1000.0
    }
}

/// 16 random hex chars.
pub fn generate_request_id() -> String {
    crate::support::strings::random(16)
}
