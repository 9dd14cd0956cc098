//! Framework error types.
//!
//! Every failure that can surface while handling a request is a variant of
//! [`Error`]. Each variant knows the HTTP status it renders as, so the
//! exception handler never has to guess.

use std::fmt;

use http::{Method, StatusCode};

use crate::config::ConfigError;

/// Errors raised while routing, resolving, or running a request handler.
#[derive(Debug)]
pub enum Error {
    /// Generic HTTP error with an explicit status (e.g. 404 "Not found").
    Http { status: StatusCode, message: String },

    /// The path exists but not for the requested method.
    MethodNotAllowed { allowed: Vec<Method> },

    /// Authentication failed; context is free-form diagnostic data.
    Auth {
        message: String,
        context: serde_json::Value,
    },

    /// A route action could not be turned into something callable.
    InvalidHandler(String),

    /// The container has no binding for this name.
    NotBound(String),

    /// A route pattern was rejected at registration time.
    RouteDefinition(String),

    /// I/O error.
    Io(std::io::Error),

    /// JSON encoding/decoding error.
    Json(serde_json::Error),

    /// Configuration could not be loaded or was invalid.
    Config(ConfigError),

    /// Custom error with message.
    Custom(String),
}

impl Error {
    /// Create a 404 "Not found" error.
    pub fn not_found() -> Self {
        Error::Http {
            status: StatusCode::NOT_FOUND,
            message: "Not found".to_string(),
        }
    }

    /// Create an HTTP error with any status.
    pub fn http(status: StatusCode, message: impl Into<String>) -> Self {
        Error::Http {
            status,
            message: message.into(),
        }
    }

    /// Create an authentication error without context.
    pub fn auth(message: impl Into<String>) -> Self {
        Error::Auth {
            message: message.into(),
            context: serde_json::Value::Null,
        }
    }

    /// HTTP status this error renders as.
    pub fn status(&self) -> StatusCode {
        match self {
            Error::Http { status, .. } => *status,
            Error::MethodNotAllowed { .. } => StatusCode::METHOD_NOT_ALLOWED,
            Error::Auth { .. } => StatusCode::UNAUTHORIZED,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Short machine-readable error kind, used as log context.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Http { .. } => "http",
            Error::MethodNotAllowed { .. } => "method_not_allowed",
            Error::Auth { .. } => "auth",
            Error::InvalidHandler(_) => "invalid_handler",
            Error::NotBound(_) => "container",
            Error::RouteDefinition(_) => "route_definition",
            Error::Io(_) => "io",
            Error::Json(_) => "json",
            Error::Config(_) => "config",
            Error::Custom(_) => "custom",
        }
    }

    /// Methods to advertise in the `Allow` header, if any.
    pub fn allowed_methods(&self) -> Option<&[Method]> {
        match self {
            Error::MethodNotAllowed { allowed } => Some(allowed),
            _ => None,
        }
    }

    /// Extra diagnostic context carried by the error.
    pub fn context(&self) -> Option<&serde_json::Value> {
        match self {
            Error::Auth { context, .. } if !context.is_null() => Some(context),
            _ => None,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Http { message, .. } => write!(f, "{}", message),
            Error::MethodNotAllowed { allowed } => {
                let names: Vec<&str> = allowed.iter().map(|m| m.as_str()).collect();
                write!(f, "The allowed methods are {}", names.join(", "))
            }
            Error::Auth { message, .. } => write!(f, "{}", message),
            Error::InvalidHandler(msg) => write!(f, "{}", msg),
            Error::NotBound(name) => write!(f, "no container binding for '{}'", name),
            Error::RouteDefinition(msg) => write!(f, "{}", msg),
            Error::Io(e) => write!(f, "I/O error: {}", e),
            Error::Json(e) => write!(f, "JSON error: {}", e),
            Error::Config(e) => write!(f, "Configuration error: {}", e),
            Error::Custom(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            Error::Json(e) => Some(e),
            Error::Config(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e)
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Json(e)
    }
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Error::Config(e)
    }
}

impl From<String> for Error {
    fn from(msg: String) -> Self {
        Error::Custom(msg)
    }
}

impl From<&str> for Error {
    fn from(msg: &str) -> Self {
        Error::Custom(msg.to_string())
    }
}

/// Result type alias for framework operations.
pub type Result<T> = std::result::Result<T, Error>;
