//! Link rewriting engine.
//!
//! # Data Flow
//! ```text
//! HTML body chunks
//!     → html.rs (lol_html tokenizer, emits (tag, attribute, value))
//!     → attribute.rs (rule table lookup, single-URL or srcset rewrite)
//!     → url.rs (resolve against target, wrap as {proxy_origin}/{absolute})
//!
//! Buffered stylesheet
//!     → css.rs (url() / @import tokens)
//!     → url.rs
//! ```
//!
//! # Design Decisions
//! - Fail-open: anything that cannot be resolved is emitted unchanged
//! - HTML is streamed; only the tokenizer's lookahead is ever buffered
//! - The rule table is plain data, independent of the scanner

pub mod attribute;
pub mod css;
pub mod html;
pub mod url;

pub use attribute::{AttributeRewriter, LinkDispatcher, RewriteRules, RewriteTarget, DEFAULT_TARGETS};
pub use css::rewrite_css;
pub use html::{rewrite_stream, AttributeHandler, BoxError};
pub use url::{is_local_reference, proxy_reference, resolve, ProxyOrigin};
