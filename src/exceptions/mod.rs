//! Exception reporting and rendering.
//!
//! Errors returned by route actions end up in [`ExceptionHandler`]: `report`
//! writes them to the application log, `render` turns them into a JSON,
//! HTML or plain-text response depending on the client and debug mode.

mod error_pages;
mod handler;

pub use error_pages::ErrorPages;
pub use handler::{debug_report, ErrorFormat, ExceptionHandler};
