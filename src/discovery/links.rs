//! Anchor extraction from listing page HTML.
//!
//! Listing pages are small and server-rendered, so anchors are pulled out with
//! a handful of static regexes rather than a full DOM parser.

use std::sync::LazyLock;

use regex::Regex;

/// Substring identifying links served by the document proxy.
pub const DOCUMENT_LINK_MARKER: &str = "GetDocument";

static ANCHOR_RE: LazyLock<Regex> =
    LazyLock::new(|| compile_static_regex(r"(?is)<a\b([^>]*)>(.*?)</a\s*>"));
static HREF_ATTR_RE: LazyLock<Regex> = LazyLock::new(|| {
    compile_static_regex(r#"(?is)\bhref\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'>]+))"#)
});
static TAG_RE: LazyLock<Regex> = LazyLock::new(|| compile_static_regex(r"(?s)<[^>]*>"));
static ENTITY_RE: LazyLock<Regex> =
    LazyLock::new(|| compile_static_regex(r"&(#[0-9]+|#[xX][0-9a-fA-F]+|[a-zA-Z]+);"));
static DOC_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| compile_static_regex(r"(?i)[?&]docID=(\d+)"));

/// Compiles a regex at static init; panics on invalid pattern.
fn compile_static_regex(pattern: &str) -> Regex {
    Regex::new(pattern).unwrap_or_else(|e| panic!("invalid static regex '{pattern}': {e}"))
}

/// A hyperlink found on a listing page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Anchor {
    /// Entity-decoded `href` value, as written in the page.
    pub href: String,
    /// Visible text with markup stripped and whitespace collapsed.
    pub text: String,
}

/// Returns every `<a href=...>` in document order.
pub(crate) fn extract_anchors(html: &str) -> Vec<Anchor> {
    ANCHOR_RE
        .captures_iter(html)
        .filter_map(|caps| {
            let attrs = caps.get(1)?.as_str();
            let href_caps = HREF_ATTR_RE.captures(attrs)?;
            let raw_href = href_caps
                .get(1)
                .or_else(|| href_caps.get(2))
                .or_else(|| href_caps.get(3))?
                .as_str();
            let inner = caps.get(2).map_or("", |m| m.as_str());
            Some(Anchor {
                href: decode_entities(raw_href.trim()),
                text: visible_text(inner),
            })
        })
        .collect()
}

/// True when the href points at the document proxy.
pub(crate) fn is_document_link(href: &str) -> bool {
    href.contains(DOCUMENT_LINK_MARKER)
}

/// Extracts the numeric identifier of the `docID` query parameter.
///
/// Only a parameter named exactly `docID` counts, so `parentDocID=` and
/// similar suffixed names are ignored.
#[must_use]
pub fn extract_doc_id(href: &str) -> Option<String> {
    DOC_ID_RE
        .captures(href)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

fn visible_text(inner_html: &str) -> String {
    let without_tags = TAG_RE.replace_all(inner_html, " ");
    let decoded = decode_entities(&without_tags);
    decoded.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn decode_entities(value: &str) -> String {
    ENTITY_RE
        .replace_all(value, |caps: &regex::Captures<'_>| {
            let entity = &caps[1];
            decode_entity(entity).map_or_else(|| caps[0].to_string(), |c| c.to_string())
        })
        .into_owned()
}

fn decode_entity(entity: &str) -> Option<char> {
    if let Some(hex) = entity
        .strip_prefix("#x")
        .or_else(|| entity.strip_prefix("#X"))
    {
        return u32::from_str_radix(hex, 16).ok().and_then(char::from_u32);
    }
    if let Some(dec) = entity.strip_prefix('#') {
        return dec.parse::<u32>().ok().and_then(char::from_u32);
    }
    match entity {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some(' '),
        _ => None,
    }
}
