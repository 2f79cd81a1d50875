//! Streaming HTML attribute rewriting.
//!
//! # Responsibilities
//! - Tokenize the document incrementally with `lol_html` as chunks arrive
//! - Report every `(tag, attribute, value)` on every element to an [`AttributeHandler`]
//! - Write replacement values back; everything else leaves the tokenizer unchanged
//!
//! # Design Decisions
//! - One `*` element handler; which attributes matter is decided by the handler's
//!   rule table, not by selectors
//! - Comments and raw-text elements (`script`, `style`, ...) follow HTML5 tokenization
//! - Send-able handler types so the rewriter can live inside a response body stream

use std::sync::{Arc, Mutex};

use bytes::Bytes;
use futures_util::stream::{self, Stream, StreamExt};
use lol_html::errors::RewritingError;
use lol_html::{element, send, HtmlRewriter};

/// Error type carried by the rewritten body stream.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Receives every attribute observed on an element.
pub trait AttributeHandler {
    /// Returns a replacement value, or `None` to keep the original.
    fn on_attribute(&mut self, tag: &str, attribute: &str, value: &str) -> Option<String>;
}

/// Rewriter output collected between writes.
type Output = Arc<Mutex<Vec<u8>>>;

fn attribute_settings<H>(mut handler: H) -> send::Settings<'static, 'static>
where
    H: AttributeHandler + Send + 'static,
{
    send::Settings {
        element_content_handlers: vec![element!("*", move |el| {
            let tag = el.tag_name();
            let replacements: Vec<(String, String)> = el
                .attributes()
                .iter()
                .filter_map(|attr| {
                    let name = attr.name();
                    handler
                        .on_attribute(&tag, &name, &attr.value())
                        .map(|value| (name, value))
                })
                .collect();
            for (name, value) in replacements {
                el.set_attribute(&name, &value)?;
            }
            Ok(())
        })],
        ..send::Settings::new_send()
    }
}

fn output_sink(output: Output) -> impl FnMut(&[u8]) + Send + 'static {
    move |chunk: &[u8]| {
        if let Ok(mut buf) = output.lock() {
            buf.extend_from_slice(chunk);
        }
    }
}

fn drain(output: &Output) -> Bytes {
    output
        .lock()
        .map(|mut buf| Bytes::from(std::mem::take(&mut *buf)))
        .unwrap_or_default()
}

fn rewrite_failed(e: RewritingError) -> BoxError {
    tracing::warn!(error = %e, "HTML rewrite aborted");
    format!("html rewrite failed: {}", e).into()
}

/// Run an upstream body through the attribute rewriter, chunk by chunk.
///
/// Only the tokenizer's lookahead is buffered. An upstream or rewriter error
/// ends the stream after being forwarded; bytes already emitted stay emitted.
pub fn rewrite_stream<S, E, H>(
    upstream: S,
    handler: H,
) -> impl Stream<Item = Result<Bytes, BoxError>> + Send
where
    S: Stream<Item = Result<Bytes, E>> + Send + 'static,
    E: Into<BoxError> + Send + 'static,
    H: AttributeHandler + Send + 'static,
{
    let output = Output::default();
    let rewriter = HtmlRewriter::new(attribute_settings(handler), output_sink(output.clone()));

    stream::unfold(
        Some((Box::pin(upstream), rewriter, output)),
        |state| async move {
            let (mut upstream, mut rewriter, output) = state?;
            loop {
                match upstream.next().await {
                    Some(Ok(chunk)) => {
                        if let Err(e) = rewriter.write(&chunk) {
                            return Some((Err(rewrite_failed(e)), None));
                        }
                        let ready = drain(&output);
                        if !ready.is_empty() {
                            return Some((Ok(ready), Some((upstream, rewriter, output))));
                        }
                    }
                    Some(Err(e)) => return Some((Err(e.into()), None)),
                    None => {
                        if let Err(e) = rewriter.end() {
                            return Some((Err(rewrite_failed(e)), None));
                        }
                        let rest = drain(&output);
                        return (!rest.is_empty()).then_some((Ok(rest), None));
                    }
                }
            }
        },
    )
}
