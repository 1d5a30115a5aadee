//! Sniffing and tag-content extraction for RSS and Atom documents.
//!
//! Matching is deliberately literal: a tag matches only when it appears
//! exactly as `<name>` (case-sensitive, no attributes, no namespace prefix).
//! Content between the first opening tag and the next closing tag is taken
//! as-is and trimmed. Entities are not decoded.

use super::meta::{FeedFormat, FeedMeta};

const ATOM_NAMESPACE: &str = r#"xmlns="http://www.w3.org/2005/Atom""#;

/// Extracts feed metadata from a raw document body.
///
/// Attempts run in this order, stopping at the first success:
///
/// 1. The sniffed format, if the body carries RSS markers (`<rss`, `<channel>`)
///    or, failing that, Atom markers (`<feed` plus the Atom namespace).
/// 2. RSS, unconditionally.
/// 3. Atom, unconditionally.
///
/// Returns `None` when every attempt fails.
pub fn extract_feed_meta(body: &str) -> Option<FeedMeta> {
    attempt_order(body).into_iter().find_map(|format| {
        let meta = match format {
            FeedFormat::Rss => extract_rss(body),
            FeedFormat::Atom => extract_atom(body),
        };
        if meta.is_some() {
            tracing::debug!(format = %format, "Extracted feed metadata");
        }
        meta
    })
}

/// Classifies a body by substring presence alone.
///
/// Markers anywhere in the text count, including inside comments or CDATA.
pub fn sniff_format(body: &str) -> Option<FeedFormat> {
    if body.contains("<rss") || body.contains("<channel>") {
        Some(FeedFormat::Rss)
    } else if body.contains("<feed") && body.contains(ATOM_NAMESPACE) {
        Some(FeedFormat::Atom)
    } else {
        None
    }
}

/// Formats to try for `body`, sniffed format first, without repeats.
///
/// Extraction is a pure function of the body, so an attempt that already
/// failed is not run a second time.
fn attempt_order(body: &str) -> Vec<FeedFormat> {
    let mut order = Vec::with_capacity(2);
    let candidates = sniff_format(body)
        .into_iter()
        .chain([FeedFormat::Rss, FeedFormat::Atom]);
    for format in candidates {
        if !order.contains(&format) {
            order.push(format);
        }
    }
    order
}

/// RSS rule: title and description of the first `<channel>` block.
pub fn extract_rss(body: &str) -> Option<FeedMeta> {
    let channel = tag_content(body, "channel")?;
    let title = non_blank(tag_content(channel, "title")?)?;
    let description = tag_content(channel, "description").and_then(non_blank);

    Some(FeedMeta { title, description })
}

/// Atom rule: first `<title>` and first `<subtitle>` in the document.
pub fn extract_atom(body: &str) -> Option<FeedMeta> {
    let title = non_blank(tag_content(body, "title")?)?;
    let description = tag_content(body, "subtitle").and_then(non_blank);

    Some(FeedMeta { title, description })
}

/// Returns the raw text between the first `<tag>` and the next `</tag>`.
///
/// Equivalent to the non-greedy pattern `<tag>([\s\S]*?)</tag>`: if the first
/// opening tag has no closing tag after it, no later one can either.
fn tag_content<'a>(haystack: &'a str, tag: &str) -> Option<&'a str> {
    let open = format!("<{tag}>");
    let close = format!("</{tag}>");

    let start = haystack.find(&open)? + open.len();
    let len = haystack[start..].find(&close)?;
    Some(&haystack[start..start + len])
}

fn non_blank(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_owned())
    }
}
