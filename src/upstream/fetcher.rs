//! Client for the intermediary fetcher.

use std::time::Duration;

use axum::body::{Body, HttpBody};
use axum::http::{HeaderMap, HeaderName, Method};
use url::Url;

use crate::config::{FetcherConfig, ForwardMode, TimeoutConfig};
use crate::http::error::ProxyError;
use crate::http::headers::outbound_request_headers;

/// Errors raised while building the fetcher at startup.
#[derive(Debug, thiserror::Error)]
pub enum FetcherError {
    #[error("invalid fetcher endpoint `{endpoint}`: {source}")]
    Endpoint {
        endpoint: String,
        #[source]
        source: url::ParseError,
    },

    #[error("invalid header name `{0}`")]
    HeaderName(String),

    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

/// Relays requests to the intermediary fetcher.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: reqwest::Client,
    endpoint: Url,
    mode: ForwardMode,
    strip: Vec<HeaderName>,
    response_timeout: Option<Duration>,
}

impl Fetcher {
    /// Create a fetcher from configuration.
    pub fn from_config(config: &FetcherConfig, timeouts: &TimeoutConfig) -> Result<Self, FetcherError> {
        let endpoint = Url::parse(&config.endpoint).map_err(|source| FetcherError::Endpoint {
            endpoint: config.endpoint.clone(),
            source,
        })?;

        let strip = config
            .strip_request_headers
            .iter()
            .map(|name| {
                HeaderName::from_bytes(name.as_bytes())
                    .map_err(|_| FetcherError::HeaderName(name.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut builder = reqwest::Client::builder().redirect(reqwest::redirect::Policy::none());
        if let Some(secs) = timeouts.connect_secs {
            builder = builder.connect_timeout(Duration::from_secs(secs));
        }

        Ok(Self {
            client: builder.build()?,
            endpoint,
            mode: config.mode,
            strip,
            response_timeout: timeouts.request_secs.map(Duration::from_secs),
        })
    }

    /// URL of the outbound request for `target`.
    pub fn request_url(&self, target: &Url) -> String {
        match self.mode {
            ForwardMode::Query => {
                let separator = if self.endpoint.query().is_some() { '&' } else { '?' };
                format!(
                    "{}{}q={}",
                    self.endpoint,
                    separator,
                    urlencoding::encode(target.as_str())
                )
            }
            ForwardMode::Path => {
                format!("{}/{}", self.endpoint.as_str().trim_end_matches('/'), target)
            }
        }
    }

    /// Send the caller's method, sanitized headers and body for `target`.
    ///
    /// The response timeout covers the wait for response headers only; the
    /// body then streams for as long as the fetcher keeps sending.
    pub async fn fetch(
        &self,
        method: Method,
        headers: &HeaderMap,
        body: Body,
        target: &Url,
    ) -> Result<reqwest::Response, ProxyError> {
        let url = self.request_url(target);
        tracing::debug!(method = %method, url = %url, "Forwarding to intermediary fetcher");

        let mut request = self
            .client
            .request(method, url)
            .headers(outbound_request_headers(headers, &self.strip));
        if body.size_hint().exact() != Some(0) {
            request = request.body(reqwest::Body::wrap_stream(body.into_data_stream()));
        }
        let pending = request.send();
        let response = match self.response_timeout {
            Some(limit) => tokio::time::timeout(limit, pending)
                .await
                .map_err(|_| ProxyError::UpstreamTimeout(limit))??,
            None => pending.await?,
        };
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fetcher(endpoint: &str, mode: ForwardMode) -> Fetcher {
        let config = FetcherConfig {
            endpoint: endpoint.into(),
            mode,
            ..FetcherConfig::default()
        };
        Fetcher::from_config(&config, &TimeoutConfig::default()).unwrap()
    }

    #[test]
    fn test_query_mode_encodes_target() {
        let target = Url::parse("https://ex.com/a b?x=1&y=2").unwrap();
        assert_eq!(
            fetcher("https://fetch.example/", ForwardMode::Query).request_url(&target),
            "https://fetch.example/?q=https%3A%2F%2Fex.com%2Fa%2520b%3Fx%3D1%26y%3D2"
        );
        assert_eq!(
            fetcher("https://fetch.example/relay?key=k", ForwardMode::Query).request_url(&target),
            "https://fetch.example/relay?key=k&q=https%3A%2F%2Fex.com%2Fa%2520b%3Fx%3D1%26y%3D2"
        );
    }

    #[test]
    fn test_path_mode_appends_target() {
        let target = Url::parse("https://ex.com/p?x=1").unwrap();
        assert_eq!(
            fetcher("https://fetch.example/", ForwardMode::Path).request_url(&target),
            "https://fetch.example/https://ex.com/p?x=1"
        );
    }

    #[test]
    fn test_invalid_config() {
        let config = FetcherConfig {
            endpoint: "::".into(),
            ..FetcherConfig::default()
        };
        assert!(matches!(
            Fetcher::from_config(&config, &TimeoutConfig::default()),
            Err(FetcherError::Endpoint { .. })
        ));

        let config = FetcherConfig {
            strip_request_headers: vec!["bad header".into()],
            ..FetcherConfig::default()
        };
        assert!(matches!(
            Fetcher::from_config(&config, &TimeoutConfig::default()),
            Err(FetcherError::HeaderName(_))
        ));
    }
}
