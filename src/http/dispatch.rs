//! Response routing by content type.
//!
//! # States
//! ```text
//! force_download                      → Download    (raw body + Content-Disposition)
//! text/css, identity encoding         → Css         (buffer, rewrite url())
//! text/html, identity encoding        → Html        (streamed attribute rewrite)
//! anything else                       → Passthrough (raw body)
//! ```
//! One dispatch per response; every state ends the request.

use axum::body::Body;
use axum::http::{header, HeaderValue};
use axum::response::Response;
use url::Url;

use crate::http::context::ProxyRequestContext;
use crate::http::error::ProxyError;
use crate::http::headers::sanitize_response_headers;
use crate::rewrite::{rewrite_css, rewrite_stream, AttributeRewriter, LinkDispatcher, RewriteRules};

/// Filename used when the target path has no usable last segment.
pub const DEFAULT_DOWNLOAD_NAME: &str = "download";

/// Transformation applied to an upstream body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentRoute {
    Download,
    Css,
    Html,
    Passthrough,
}

impl ContentRoute {
    /// Pick the route for a response. A compressed body is never rewritten.
    pub fn select(force_download: bool, content_type: &str, content_encoding: Option<&str>) -> Self {
        if force_download {
            return ContentRoute::Download;
        }
        let encoded = content_encoding
            .map(str::trim)
            .is_some_and(|e| !e.is_empty() && !e.eq_ignore_ascii_case("identity"));
        if encoded {
            return ContentRoute::Passthrough;
        }

        let content_type = content_type.to_ascii_lowercase();
        if content_type.contains("text/css") {
            ContentRoute::Css
        } else if content_type.contains("text/html") {
            ContentRoute::Html
        } else {
            ContentRoute::Passthrough
        }
    }

    /// Label for logs and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentRoute::Download => "download",
            ContentRoute::Css => "css",
            ContentRoute::Html => "html",
            ContentRoute::Passthrough => "passthrough",
        }
    }
}

/// Last path segment of the target if it looks like a file name.
pub fn download_filename(target: &Url) -> &str {
    target
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .filter(|segment| segment.contains('.'))
        .unwrap_or(DEFAULT_DOWNLOAD_NAME)
}

fn content_disposition(target: &Url) -> HeaderValue {
    let name = download_filename(target).replace('"', "");
    HeaderValue::from_str(&format!("attachment; filename=\"{}\"", name))
        .unwrap_or_else(|_| HeaderValue::from_static("attachment; filename=\"download\""))
}

/// Turn the fetcher's response into the caller's response.
///
/// Headers are sanitized first, then the body goes down the selected route.
/// The upstream status code is passed through unchanged.
pub async fn build_response(
    ctx: &ProxyRequestContext,
    upstream: reqwest::Response,
) -> Result<(ContentRoute, Response), ProxyError> {
    let status = upstream.status();
    let mut headers = upstream.headers().clone();
    sanitize_response_headers(&mut headers, ctx);

    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    let content_encoding = headers
        .get(header::CONTENT_ENCODING)
        .and_then(|v| v.to_str().ok());
    let route = ContentRoute::select(ctx.force_download, content_type, content_encoding);

    let body = match route {
        ContentRoute::Download => {
            headers.insert(header::CONTENT_DISPOSITION, content_disposition(&ctx.target_url));
            Body::from_stream(upstream.bytes_stream())
        }
        ContentRoute::Css => {
            let raw = upstream.bytes().await?;
            headers.remove(header::CONTENT_LENGTH);
            Body::from(rewrite_css(&raw, &ctx.target_url, &ctx.proxy_origin))
        }
        ContentRoute::Html => {
            headers.remove(header::CONTENT_LENGTH);
            let dispatcher = LinkDispatcher::new(
                RewriteRules::default(),
                AttributeRewriter::new(ctx.target_url.clone(), ctx.proxy_origin.clone()),
            );
            Body::from_stream(rewrite_stream(upstream.bytes_stream(), dispatcher))
        }
        ContentRoute::Passthrough => Body::from_stream(upstream.bytes_stream()),
    };

    let mut response = Response::new(body);
    *response.status_mut() = status;
    *response.headers_mut() = headers;
    Ok((route, response))
}
