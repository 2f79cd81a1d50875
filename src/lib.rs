//! Link-rewriting forward proxy.
//!
//! Fetches `/{target}` through an intermediary fetcher and rewrites links in
//! HTML and CSS so that every reference points back through the proxy.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod rewrite;
pub mod upstream;

pub use config::schema::ProxyConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
