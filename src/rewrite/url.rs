//! URL resolution and proxied URL composition.
//!
//! # Responsibilities
//! - Classify references that must never be rewritten (`data:`, `mailto:`, `#frag`)
//! - Resolve relative or absolute references against the target's base URL
//! - Compose the proxied form `{proxy_origin}/{absolute_url}`
//!
//! # Design Decisions
//! - Resolution failures are values, not panics; callers keep the original text
//! - The absolute URL is embedded verbatim as the proxy path suffix (no extra encoding)

use std::fmt;

use url::Url;

/// Prefixes of references that point inside the document or carry their own payload.
const LOCAL_PREFIXES: [&str; 3] = ["data:", "mailto:", "#"];

/// Scheme + host (+ port) the proxy is served under, without a trailing slash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyOrigin(String);

impl ProxyOrigin {
    /// Build from any URL on the proxy; only its origin is kept.
    pub fn from_url(url: &Url) -> Self {
        Self(url.origin().ascii_serialization())
    }

    /// Parse an origin string such as `https://proxy.example`.
    pub fn parse(input: &str) -> Result<Self, url::ParseError> {
        Url::parse(input).map(|url| Self::from_url(&url))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `{origin}/{absolute}`.
    pub fn proxied(&self, absolute: &Url) -> String {
        format!("{}/{}", self.0, absolute)
    }
}

impl fmt::Display for ProxyOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Returns true for `data:`, `mailto:` and fragment-only references.
pub fn is_local_reference(reference: &str) -> bool {
    LOCAL_PREFIXES.iter().any(|prefix| reference.starts_with(prefix))
}

/// Resolve `reference` against `base` using standard reference resolution.
pub fn resolve(reference: &str, base: &Url) -> Result<Url, url::ParseError> {
    base.join(reference)
}

/// Resolve and wrap in one step. `None` means the reference could not be resolved
/// and the caller keeps its original value.
pub fn proxy_reference(reference: &str, base: &Url, origin: &ProxyOrigin) -> Option<String> {
    match resolve(reference, base) {
        Ok(absolute) => Some(origin.proxied(&absolute)),
        Err(e) => {
            tracing::trace!(reference = %reference, error = %e, "Leaving unresolvable reference untouched");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://ex.com/dir/page.html").unwrap()
    }

    #[test]
    fn test_resolve_relative_and_absolute() {
        assert_eq!(resolve("a.png", &base()).unwrap().as_str(), "https://ex.com/dir/a.png");
        assert_eq!(resolve("/root.css", &base()).unwrap().as_str(), "https://ex.com/root.css");
        assert_eq!(resolve("../up.js", &base()).unwrap().as_str(), "https://ex.com/up.js");
        assert_eq!(
            resolve("//cdn.ex.com/lib.js", &base()).unwrap().as_str(),
            "https://cdn.ex.com/lib.js"
        );
        assert_eq!(
            resolve("?page=2", &base()).unwrap().as_str(),
            "https://ex.com/dir/page.html?page=2"
        );
        assert_eq!(
            resolve("http://other.org/x?y=1#z", &base()).unwrap().as_str(),
            "http://other.org/x?y=1#z"
        );
    }

    #[test]
    fn test_resolve_is_idempotent() {
        for reference in ["a.png", "/b", "../c?d=e", "https://f.org/g", "//h.net/i#j"] {
            let once = resolve(reference, &base()).unwrap();
            let twice = resolve(once.as_str(), &base()).unwrap();
            assert_eq!(once, twice, "reference {reference}");
        }
    }

    #[test]
    fn test_resolve_failure() {
        assert!(resolve("http://[::1", &base()).is_err());
        assert!(proxy_reference("http://[::1", &base(), &ProxyOrigin::parse("https://proxy").unwrap()).is_none());
    }

    #[test]
    fn test_local_references() {
        assert!(is_local_reference("data:image/png;base64,AAAA"));
        assert!(is_local_reference("mailto:someone@ex.com"));
        assert!(is_local_reference("#top"));
        assert!(!is_local_reference("https://ex.com/#top"));
        assert!(!is_local_reference("page.html"));
    }

    #[test]
    fn test_proxy_origin_strips_path() {
        let origin = ProxyOrigin::parse("https://proxy/").unwrap();
        assert_eq!(origin.as_str(), "https://proxy");

        let origin = ProxyOrigin::parse("http://127.0.0.1:8080/some/path?x=1").unwrap();
        assert_eq!(origin.as_str(), "http://127.0.0.1:8080");
    }

    #[test]
    fn test_proxied_embeds_absolute_url_verbatim() {
        let origin = ProxyOrigin::parse("https://proxy").unwrap();
        let proxied = proxy_reference("next?a=1&b=2", &base(), &origin).unwrap();
        assert_eq!(proxied, "https://proxy/https://ex.com/dir/next?a=1&b=2");
    }
}
