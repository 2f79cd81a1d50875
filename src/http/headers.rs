//! Header sanitization in both directions.
//!
//! # Responsibilities
//! - Outbound: drop client-identifying, hop-by-hop and encoding headers
//! - Inbound: drop headers that block embedding, unscope cookies, rewrite redirects
//!
//! # Design Decisions
//! - Every `Set-Cookie` value is handled on its own; cookies are never merged
//! - A `Location` that cannot be resolved is forwarded unchanged

use axum::http::header::{self, HeaderMap, HeaderName, HeaderValue};

use crate::http::context::ProxyRequestContext;
use crate::rewrite::proxy_reference;

/// Response headers that stop the rewritten page from rendering inside the caller's context.
pub const EMBEDDING_BLOCKERS: [HeaderName; 3] = [
    header::CONTENT_SECURITY_POLICY,
    header::X_FRAME_OPTIONS,
    header::X_XSS_PROTECTION,
];

/// Connection-scoped headers that must not be relayed.
const HOP_BY_HOP: [&str; 7] = [
    "connection",
    "keep-alive",
    "proxy-connection",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

/// Copy of the inbound request headers fit for the intermediary fetcher.
///
/// `strip` holds the configured client-identifying names. `Host` is dropped
/// so the client sets the fetcher's own, and `Accept-Encoding` so bodies
/// arrive uncompressed and can be rewritten.
pub fn outbound_request_headers(inbound: &HeaderMap, strip: &[HeaderName]) -> HeaderMap {
    let mut headers = inbound.clone();
    for name in strip {
        headers.remove(name);
    }
    headers.remove(header::HOST);
    headers.remove(header::ACCEPT_ENCODING);
    remove_hop_by_hop(&mut headers);
    headers
}

/// Sanitize upstream response headers in place.
pub fn sanitize_response_headers(headers: &mut HeaderMap, ctx: &ProxyRequestContext) {
    for name in &EMBEDDING_BLOCKERS {
        headers.remove(name);
    }
    remove_hop_by_hop(headers);
    strip_cookie_domains(headers);
    rewrite_location(headers, ctx);
}

fn remove_hop_by_hop(headers: &mut HeaderMap) {
    for name in HOP_BY_HOP {
        headers.remove(name);
    }
}

/// Rewrite every `Set-Cookie` so it is scoped to the proxy's origin.
pub fn strip_cookie_domains(headers: &mut HeaderMap) {
    let cookies: Vec<HeaderValue> = headers.get_all(header::SET_COOKIE).iter().cloned().collect();
    if cookies.is_empty() {
        return;
    }
    headers.remove(header::SET_COOKIE);
    for cookie in cookies {
        let sanitized = cookie
            .to_str()
            .ok()
            .map(strip_cookie_domain)
            .and_then(|text| HeaderValue::from_str(&text).ok());
        headers.append(header::SET_COOKIE, sanitized.unwrap_or(cookie));
    }
}

/// Drop `Domain=...` attributes from a single `Set-Cookie` value.
pub fn strip_cookie_domain(cookie: &str) -> String {
    let mut parts = cookie.split(';');
    let mut out = parts.next().unwrap_or_default().trim_end().to_string();
    for attribute in parts {
        let attribute = attribute.trim();
        if attribute.is_empty() {
            continue;
        }
        let name = attribute.split('=').next().unwrap_or_default().trim();
        if name.eq_ignore_ascii_case("domain") {
            continue;
        }
        out.push_str("; ");
        out.push_str(attribute);
    }
    out
}

/// Point `Location` back through the proxy.
pub fn rewrite_location(headers: &mut HeaderMap, ctx: &ProxyRequestContext) {
    let Some(location) = headers.get(header::LOCATION).and_then(|v| v.to_str().ok()) else {
        return;
    };
    let Some(proxied) = proxy_reference(location, &ctx.target_url, &ctx.proxy_origin) else {
        return;
    };
    match HeaderValue::from_str(&proxied) {
        Ok(value) => {
            headers.insert(header::LOCATION, value);
        }
        Err(e) => tracing::debug!(location = %proxied, error = %e, "Keeping original Location"),
    }
}
