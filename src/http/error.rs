//! Request-level errors and their HTTP mapping.
//!
//! Rewriting failures never show up here: they are recovered per token.

use std::time::Duration;

use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};

/// Errors that terminate a proxied request before any body is sent.
#[derive(Debug, thiserror::Error)]
pub enum ProxyError {
    /// No target URL in the request path.
    #[error("missing target URL")]
    MissingTarget,

    /// The target could not be parsed even after adding a scheme.
    #[error("invalid target URL `{target}`: {source}")]
    InvalidTarget {
        target: String,
        #[source]
        source: url::ParseError,
    },

    /// Neither a configured public origin nor a usable Host header.
    #[error("cannot determine proxy origin from request")]
    MissingHost,

    /// Network, DNS or timeout failure talking to the intermediary fetcher.
    #[error("upstream fetch failed: {0}")]
    Upstream(#[from] reqwest::Error),

    /// The fetcher sent no response headers within the configured limit.
    #[error("upstream fetch failed: no response within {}s", .0.as_secs())]
    UpstreamTimeout(Duration),

    /// The outgoing response could not be assembled.
    #[error("failed to build response: {0}")]
    Response(#[from] axum::http::Error),
}

impl ProxyError {
    pub fn status(&self) -> StatusCode {
        match self {
            ProxyError::MissingTarget | ProxyError::InvalidTarget { .. } | ProxyError::MissingHost => {
                StatusCode::BAD_REQUEST
            }
            ProxyError::Upstream(_) | ProxyError::UpstreamTimeout(_) => StatusCode::BAD_GATEWAY,
            ProxyError::Response(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = format!("Proxy error: {}", error_chain(&self));
        (
            status,
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            body,
        )
            .into_response()
    }
}

/// `err: cause: cause` so the underlying transport message reaches the caller.
fn error_chain(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !message.contains(&text) {
            message.push_str(": ");
            message.push_str(&text);
        }
        source = cause.source();
    }
    message
}
