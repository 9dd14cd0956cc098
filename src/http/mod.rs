//! HTTP kernel and middleware.
//!
//! ```rust,ignore
//! use careminate::http::{Kernel, middleware::AccessLogMiddleware};
//!
//! let kernel = Kernel::new(router, container, exceptions)
//!     .with_middleware(AccessLogMiddleware::new());
//! let response = kernel.handle(request).await;
//! ```

mod kernel;
pub mod middleware;

pub use kernel::Kernel;
pub use middleware::{Middleware, MiddlewareChain, MiddlewareResult};
