//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! Inbound request
//!     → server.rs (Axum setup, middleware, handler)
//!     → context.rs (target URL, download flag, proxy origin)
//!     → [upstream fetcher] (outbound headers sanitized in headers.rs)
//!     → headers.rs (response header sanitization)
//!     → dispatch.rs (css / html / download / passthrough)
//!     → Send to client
//! ```

pub mod context;
pub mod dispatch;
pub mod error;
pub mod headers;
pub mod landing;
pub mod server;

pub use context::{Inbound, ProxyRequestContext};
pub use dispatch::ContentRoute;
pub use error::ProxyError;
pub use server::{HttpServer, ServerError};
