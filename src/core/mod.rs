//! Core types for HTTP request/response handling.
//!
//! - [`Request`] - parsed HTTP request (query, form, JSON, cookies, uploads)
//! - [`Response`] - HTTP response with builder
//! - [`Context`] - request-scoped data for middleware
//! - [`Error`] - framework errors, each mapped to an HTTP status
//!
//! # Example
//!
//! ```rust,ignore
//! use careminate::core::{Request, Response};
//!
//! fn greet(req: &Request) -> Response {
//!     let name = req.get_str("name").unwrap_or("stranger");
//!     Response::html(format!("<h1>Hello {}</h1>", name))
//! }
//! ```

mod context;
mod error;
pub mod params;
mod request;
mod response;

pub use context::{generate_request_id, Context};
pub use error::{Error, Result};
pub use params::Params;
pub use request::{Request, UploadedFile};
pub use response::{Response, ResponseBuilder};
