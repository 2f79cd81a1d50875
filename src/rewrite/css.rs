//! Stylesheet `url()` rewriting.
//!
//! Works on the fully buffered stylesheet. Operates on bytes so that a sheet
//! in a legacy encoding comes back unchanged apart from rewritten tokens.

use std::sync::LazyLock;

use regex::bytes::{Captures, Regex};
use url::Url;

use crate::rewrite::url::{proxy_reference, ProxyOrigin};

/// `url( "x" )`, `url('x')`, `url(x)` and the string form of `@import`.
static CSS_REFERENCE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?i)url\s*\(\s*(?:"(?P<dq>[^"\n]*)"|'(?P<sq>[^'\n]*)'|(?P<bare>[^"'()\s]*))\s*\)|@import\s+(?:"(?P<idq>[^"\n]*)"|'(?P<isq>[^'\n]*)')"#,
    )
    .expect("valid CSS reference regex")
});

/// Rewrite every `url()` token (and `@import "..."`) to go through the proxy.
///
/// Tokens that are empty, `data:` or `#fragment` references, not UTF-8, or
/// that fail to resolve are copied through untouched.
pub fn rewrite_css(css: &[u8], base: &Url, origin: &ProxyOrigin) -> Vec<u8> {
    CSS_REFERENCE_RE
        .replace_all(css, |caps: &Captures| -> Vec<u8> {
            let original = caps[0].to_vec();
            let (token, quote, import) = if let Some(m) = caps.name("dq") {
                (m, "\"", false)
            } else if let Some(m) = caps.name("sq") {
                (m, "'", false)
            } else if let Some(m) = caps.name("bare") {
                (m, "", false)
            } else if let Some(m) = caps.name("idq") {
                (m, "\"", true)
            } else if let Some(m) = caps.name("isq") {
                (m, "'", true)
            } else {
                return original;
            };

            let Ok(token) = std::str::from_utf8(token.as_bytes()) else {
                return original;
            };
            if token.is_empty() || token.starts_with("data:") || token.starts_with('#') {
                return original;
            }
            match proxy_reference(token, base, origin) {
                Some(proxied) if import => format!("@import {quote}{proxied}{quote}").into_bytes(),
                Some(proxied) => format!("url({quote}{proxied}{quote})").into_bytes(),
                None => original,
            }
        })
        .into_owned()
}
