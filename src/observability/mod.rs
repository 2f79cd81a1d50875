//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Request handler produces:
//!     → logging.rs (structured log events with method, target, route, status)
//!     → metrics.rs (counters, histograms)
//! tower-http adds:
//!     → TraceLayer spans, x-request-id on request and response
//! ```

pub mod logging;
pub mod metrics;

pub use logging::init_logging;
