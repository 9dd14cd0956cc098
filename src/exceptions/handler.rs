//! Error reporting and rendering.

use std::error::Error as _;
use std::sync::Arc;

use http::header::ALLOW;
use http::{HeaderValue, StatusCode};
use serde_json::{json, Value};

use super::ErrorPages;
use crate::core::{Error, Request, Response};
use crate::logging::{LogLevel, Logger};
use crate::support::escape_html;

/// Response representation chosen from the request's `Accept` header.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorFormat {
    Json,
    Html,
    Text,
}

impl ErrorFormat {
    /// JSON wins over HTML; anything else gets plain text.
    pub fn negotiate(request: &Request) -> Self {
        if request.wants_json() {
            ErrorFormat::Json
        } else if request.accepts_html() {
            ErrorFormat::Html
        } else {
            ErrorFormat::Text
        }
    }
}

/// Turns request errors into log entries and HTTP responses.
#[derive(Clone, Debug)]
pub struct ExceptionHandler {
    logger: Arc<Logger>,
    debug: bool,
    error_pages: ErrorPages,
}

impl ExceptionHandler {
    pub fn new(logger: Arc<Logger>, debug: bool) -> Self {
        Self {
            logger,
            debug,
            error_pages: ErrorPages::new(),
        }
    }

    pub fn with_error_pages(mut self, pages: ErrorPages) -> Self {
        self.error_pages = pages;
        self
    }

    pub fn is_debug(&self) -> bool {
        self.debug
    }

    /// Write the error to the application log. Server errors are logged at
    /// `error`, everything else at `info`.
    pub fn report(&self, error: &Error, request_id: &str) {
        let status = error.status();
        let level = if status.is_server_error() {
            LogLevel::Error
        } else {
            LogLevel::Info
        };

        let mut context = json!({
            "status": status.as_u16(),
            "kind": error.kind(),
            "request_id": request_id,
        });
        if let (Some(extra), Value::Object(map)) = (error.context(), &mut context) {
            map.insert("context".to_string(), extra.clone());
        }

        if status.is_server_error() {
            tracing::error!(kind = error.kind(), request_id, "{}", error);
        } else {
            tracing::debug!(kind = error.kind(), request_id, "{}", error);
        }

        self.logger.log(level, &error.to_string(), Some(&context));
    }

    /// Build the response for `error`.
    pub fn render(&self, error: &Error, format: ErrorFormat) -> Response {
        let status = error.status();

        let response = if format == ErrorFormat::Json {
            Response::json(&json!({
                "error": self.public_message(error),
                "status": status.as_u16(),
            }))
        } else if self.debug {
            let report = debug_report(error);
            match format {
                ErrorFormat::Html => Response::html(format!("<pre>{}</pre>", escape_html(&report))),
                _ => Response::text(report),
            }
        } else {
            match (format, self.error_pages.get(status.as_u16())) {
                (ErrorFormat::Html, Some(page)) => Response::html(page.clone()),
                _ => Response::text(reason(status)),
            }
        };

        let response = response.with_status(status);

        match error.allowed_methods() {
            Some(methods) => {
                let allow = methods
                    .iter()
                    .map(|m| m.as_str())
                    .collect::<Vec<_>>()
                    .join(", ");
                match HeaderValue::from_str(&allow) {
                    Ok(value) => response.with_header_value(ALLOW, value),
                    Err(_) => response,
                }
            }
            None => response,
        }
    }

    // Server error details stay out of production responses
    fn public_message(&self, error: &Error) -> String {
        if self.debug || !error.status().is_server_error() {
            error.to_string()
        } else {
            reason(error.status()).to_string()
        }
    }
}

fn reason(status: StatusCode) -> &'static str {
    status.canonical_reason().unwrap_or("Error")
}

/// Plain-text description of an error and its causes.
pub fn debug_report(error: &Error) -> String {
    let status = error.status();
    let mut out = format!(
        "Exception: {}\nKind: {}\nStatus: {} {}\n",
        error,
        error.kind(),
        status.as_u16(),
        reason(status)
    );

    let mut source = error.source();
    while let Some(cause) = source {
        out.push_str(&format!("Caused by: {}\n", cause));
        source = cause.source();
    }

    if let Some(context) = error.context() {
        out.push_str(&format!("Context: {}\n", context));
    }

    out
}
