//! Element attribute rewriting.
//!
//! The document scanner in `html.rs` reports every `(tag, attribute, value)` it
//! sees. [`LinkDispatcher`] looks the pair up in a [`RewriteRules`] table and
//! hands eligible values to the [`AttributeRewriter`].

use url::Url;

use crate::rewrite::html::AttributeHandler;
use crate::rewrite::url::{is_local_reference, proxy_reference, ProxyOrigin};

/// An (element, attribute) pair whose value holds a link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RewriteTarget {
    pub tag: &'static str,
    pub attribute: &'static str,
}

impl RewriteTarget {
    pub const fn new(tag: &'static str, attribute: &'static str) -> Self {
        Self { tag, attribute }
    }
}

/// Link-bearing attributes rewritten by default.
pub const DEFAULT_TARGETS: &[RewriteTarget] = &[
    RewriteTarget::new("a", "href"),
    RewriteTarget::new("form", "action"),
    RewriteTarget::new("img", "src"),
    RewriteTarget::new("img", "srcset"),
    RewriteTarget::new("img", "data-src"),
    RewriteTarget::new("link", "href"),
    RewriteTarget::new("script", "src"),
    RewriteTarget::new("iframe", "src"),
    RewriteTarget::new("source", "src"),
];

/// Lookup table of eligible (tag, attribute) pairs.
#[derive(Debug, Clone, Copy)]
pub struct RewriteRules {
    targets: &'static [RewriteTarget],
}

impl RewriteRules {
    pub const fn new(targets: &'static [RewriteTarget]) -> Self {
        Self { targets }
    }

    /// Names are compared ASCII case-insensitively.
    pub fn matches(&self, tag: &str, attribute: &str) -> bool {
        self.targets.iter().any(|t| {
            t.tag.eq_ignore_ascii_case(tag) && t.attribute.eq_ignore_ascii_case(attribute)
        })
    }

    pub fn targets(&self) -> &'static [RewriteTarget] {
        self.targets
    }
}

impl Default for RewriteRules {
    fn default() -> Self {
        Self::new(DEFAULT_TARGETS)
    }
}

/// Rewrites a single attribute value against the page's base URL.
#[derive(Debug, Clone)]
pub struct AttributeRewriter {
    base: Url,
    origin: ProxyOrigin,
}

impl AttributeRewriter {
    pub fn new(base: Url, origin: ProxyOrigin) -> Self {
        Self { base, origin }
    }

    /// Returns the replacement value, or `None` to keep the original bytes.
    pub fn rewrite(&self, attribute: &str, value: &str) -> Option<String> {
        if value.is_empty() {
            return None;
        }

        if attribute.eq_ignore_ascii_case("srcset") {
            return self.rewrite_srcset(value);
        }

        if is_local_reference(value) {
            return None;
        }
        proxy_reference(value, &self.base, &self.origin)
    }

    /// Rewrites each candidate URL. Local and unresolvable candidates are kept
    /// as they were. `None` when no candidate changed.
    fn rewrite_srcset(&self, value: &str) -> Option<String> {
        let mut changed = false;
        let entries: Vec<String> = srcset_candidates(value)
            .into_iter()
            .map(|(candidate, descriptors)| {
                let url = if is_local_reference(candidate) {
                    None
                } else {
                    proxy_reference(candidate, &self.base, &self.origin)
                };
                changed |= url.is_some();
                let url = url.as_deref().unwrap_or(candidate);
                if descriptors.is_empty() {
                    url.to_string()
                } else {
                    format!("{} {}", url, descriptors)
                }
            })
            .collect();
        changed.then(|| entries.join(", "))
    }
}

/// Split a srcset into `(url, descriptors)` candidates.
///
/// A URL runs to the next whitespace, so commas inside it (as in `data:` URLs)
/// do not end the candidate. Descriptors run to the next comma and are
/// re-joined with single spaces.
fn srcset_candidates(value: &str) -> Vec<(&str, String)> {
    let is_separator = |c: char| c.is_ascii_whitespace() || c == ',';
    let mut candidates = Vec::new();
    let mut rest = value;
    loop {
        rest = rest.trim_start_matches(is_separator);
        if rest.is_empty() {
            break;
        }
        let url_end = rest.find(|c: char| c.is_ascii_whitespace()).unwrap_or(rest.len());
        let url = &rest[..url_end];
        rest = &rest[url_end..];

        if url.ends_with(',') {
            candidates.push((url.trim_end_matches(','), String::new()));
            continue;
        }
        let descriptors_end = rest.find(',').unwrap_or(rest.len());
        let descriptors = rest[..descriptors_end]
            .split_ascii_whitespace()
            .collect::<Vec<_>>()
            .join(" ");
        rest = &rest[descriptors_end..];
        candidates.push((url, descriptors));
    }
    candidates
}

/// Table-driven bridge between the document scanner and the rewriter.
#[derive(Debug, Clone)]
pub struct LinkDispatcher {
    rules: RewriteRules,
    rewriter: AttributeRewriter,
}

impl LinkDispatcher {
    pub fn new(rules: RewriteRules, rewriter: AttributeRewriter) -> Self {
        Self { rules, rewriter }
    }
}

impl AttributeHandler for LinkDispatcher {
    fn on_attribute(&mut self, tag: &str, attribute: &str, value: &str) -> Option<String> {
        if !self.rules.matches(tag, attribute) {
            return None;
        }
        self.rewriter.rewrite(attribute, value)
    }
}
