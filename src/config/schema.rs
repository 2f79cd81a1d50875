//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the proxy.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the rewriting proxy.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ProxyConfig {
    /// Listener configuration (bind address, public origin, landing page).
    pub listener: ListenerConfig,

    /// Intermediary fetcher that performs the outbound fetch.
    pub fetcher: FetcherConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Origin used as the prefix of every rewritten URL (e.g., "https://proxy.example").
    /// When unset, it is derived from the request's authority and `X-Forwarded-Proto`.
    pub public_origin: Option<String>,

    /// Serve the landing page on `/`. When disabled, `/` answers 400.
    pub landing_page: bool,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            public_origin: None,
            landing_page: true,
        }
    }
}

/// How the target URL is handed to the intermediary fetcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ForwardMode {
    /// `{endpoint}?q={url-encoded target}`
    #[default]
    Query,
    /// `{endpoint}/{target}`
    Path,
}

/// Intermediary fetcher configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct FetcherConfig {
    /// Fetcher URL (e.g., "https://fetcher.example.workers.dev/").
    pub endpoint: String,

    /// Target encoding on the outbound request.
    pub mode: ForwardMode,

    /// Client-identifying request headers never sent to the fetcher.
    pub strip_request_headers: Vec<String>,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://127.0.0.1:8787/".to_string(),
            mode: ForwardMode::Query,
            strip_request_headers: vec![
                "cf-connecting-ip".to_string(),
                "cf-worker".to_string(),
                "x-forwarded-for".to_string(),
            ],
        }
    }
}

/// Timeout configuration. Unset means no timeout: a hung fetch hangs the request.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Connection establishment timeout to the fetcher in seconds.
    pub connect_secs: Option<u64>,

    /// Seconds to wait for the fetcher's response headers. A timeout answers 502;
    /// the body itself is not bounded once it starts streaming.
    pub request_secs: Option<u64>,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config: ProxyConfig = toml::from_str("").unwrap();
        assert_eq!(config.listener.bind_address, "0.0.0.0:8080");
        assert!(config.listener.landing_page);
        assert_eq!(config.fetcher.mode, ForwardMode::Query);
        assert_eq!(config.fetcher.strip_request_headers.len(), 3);
        assert!(config.timeouts.request_secs.is_none());
    }

    #[test]
    fn test_full_config() {
        let config: ProxyConfig = toml::from_str(
            r#"
            [listener]
            bind_address = "127.0.0.1:9000"
            public_origin = "https://proxy.example"
            landing_page = false

            [fetcher]
            endpoint = "https://fetcher.example/"
            mode = "path"
            strip_request_headers = ["x-real-ip"]

            [timeouts]
            request_secs = 20

            [observability]
            log_level = "debug"
            "#,
        )
        .unwrap();

        assert_eq!(config.listener.public_origin.as_deref(), Some("https://proxy.example"));
        assert!(!config.listener.landing_page);
        assert_eq!(config.fetcher.mode, ForwardMode::Path);
        assert_eq!(config.fetcher.strip_request_headers, vec!["x-real-ip"]);
        assert_eq!(config.timeouts.request_secs, Some(20));
        assert_eq!(config.timeouts.connect_secs, None);
        assert_eq!(config.observability.log_level, "debug");
        assert!(!config.observability.metrics_enabled);
    }
}
