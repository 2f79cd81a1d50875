//! Intermediary fetcher subsystem.
//!
//! # Data Flow
//! ```text
//! ProxyRequestContext + inbound method/headers/body
//!     → http/headers.rs (outbound header sanitization)
//!     → fetcher.rs (encode target, send to the intermediary)
//!     → reqwest::Response (status, headers, streaming body)
//! ```
//!
//! # Design Decisions
//! - One client per process, built at startup from immutable config
//! - Redirects are never followed; `Location` is rewritten for the caller instead
//! - No retries: a failed fetch becomes a 502 for this request only

pub mod fetcher;

pub use fetcher::{Fetcher, FetcherError};
