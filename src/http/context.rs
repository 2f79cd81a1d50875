//! Per-request proxy context.
//!
//! # Responsibilities
//! - Derive the target URL from `path[1..] + query`
//! - Detect and strip the `download` query flag
//! - Synthesize `https://` for bare hosts
//! - Determine the proxy origin used as the rewrite prefix
//!
//! # Design Decisions
//! - The target is read verbatim from the path, without percent-decoding, so
//!   `{origin}/{absolute}` links produced by the rewriter round-trip
//! - A target containing its own `?` shares the proxy's query string; the
//!   `download` flag is the only key the proxy claims for itself

use axum::http::{header, HeaderMap, Uri};
use url::Url;

use crate::http::error::ProxyError;
use crate::rewrite::ProxyOrigin;

/// Query key that switches the response to attachment download.
pub const DOWNLOAD_FLAG: &str = "download";

/// Immutable facts about one proxied request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyRequestContext {
    pub proxy_origin: ProxyOrigin,
    pub target_url: Url,
    pub force_download: bool,
}

/// What the inbound request asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    /// Root path or no target at all.
    Landing,
    Proxy(ProxyRequestContext),
}

impl ProxyRequestContext {
    /// Build the context from the request line and headers.
    pub fn from_request(
        uri: &Uri,
        headers: &HeaderMap,
        public_origin: Option<&ProxyOrigin>,
    ) -> Result<Inbound, ProxyError> {
        let (target, force_download) = extract_target(uri);
        if is_landing_target(&target) {
            return Ok(Inbound::Landing);
        }

        let target = with_scheme(&target);
        let target_url = Url::parse(&target)
            .map_err(|source| ProxyError::InvalidTarget { target, source })?;

        let proxy_origin = match public_origin {
            Some(origin) => origin.clone(),
            None => origin_from_request(uri, headers)?,
        };

        Ok(Inbound::Proxy(Self {
            proxy_origin,
            target_url,
            force_download,
        }))
    }
}

/// `path[1..]` plus the query with any `download` pair removed.
pub fn extract_target(uri: &Uri) -> (String, bool) {
    let path = uri.path();
    let mut target = path.strip_prefix('/').unwrap_or(path).to_string();
    let (query, force_download) = match uri.query() {
        Some(query) => strip_download_flag(query),
        None => (None, false),
    };
    if let Some(query) = query {
        target.push('?');
        target.push_str(&query);
    }
    (target, force_download)
}

/// Remove every `download` / `download=...` pair. Returns the remaining query
/// (`None` when nothing is left) and whether the flag was present.
pub fn strip_download_flag(query: &str) -> (Option<String>, bool) {
    let mut found = false;
    let kept: Vec<&str> = query
        .split('&')
        .filter(|pair| {
            let key = pair.split('=').next().unwrap_or_default();
            if key == DOWNLOAD_FLAG {
                found = true;
                false
            } else {
                true
            }
        })
        .collect();
    let rest = kept.join("&");
    ((!rest.is_empty()).then_some(rest), found)
}

fn is_landing_target(target: &str) -> bool {
    matches!(target, "" | "/" | "favicon.ico")
}

/// Prefix `https://` unless the target already names an http(s) scheme.
pub fn with_scheme(target: &str) -> String {
    let lower = target.get(..6).unwrap_or(target).to_ascii_lowercase();
    if lower.starts_with("http:") || lower.starts_with("https:") {
        target.to_string()
    } else {
        format!("https://{}", target)
    }
}

/// `{scheme}://{authority}` from the request, honouring `X-Forwarded-Proto`.
pub fn origin_from_request(uri: &Uri, headers: &HeaderMap) -> Result<ProxyOrigin, ProxyError> {
    let authority = uri
        .authority()
        .map(|a| a.as_str().to_string())
        .or_else(|| {
            headers
                .get(header::HOST)
                .and_then(|h| h.to_str().ok())
                .map(str::to_string)
        })
        .ok_or(ProxyError::MissingHost)?;

    let scheme = headers
        .get("x-forwarded-proto")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| matches!(*v, "http" | "https"))
        .or_else(|| uri.scheme_str())
        .unwrap_or("http");

    ProxyOrigin::parse(&format!("{}://{}", scheme, authority)).map_err(|_| ProxyError::MissingHost)
}
