//! Destination filenames derived from listing link text.

/// Longest stem kept from link text, in bytes. Leaves room under the common
/// 255-byte name limit for `_{doc_id}`, `.pdf` and the `.part` suffix.
const MAX_STEM_BYTES: usize = 200;

/// Derives the on-disk filename for a document link.
///
/// The link text is sanitized for the filesystem; an empty result falls back
/// to `"{doc_id}.pdf"`, anything else gets `.pdf` appended unless it already
/// ends with it (case-insensitive).
#[must_use]
pub fn derive_filename(link_text: &str, doc_id: &str) -> String {
    let cleaned = sanitize_filename(link_text);
    if cleaned.is_empty() {
        return format!("{doc_id}.pdf");
    }
    if has_pdf_extension(&cleaned) {
        cleaned
    } else {
        format!("{cleaned}.pdf")
    }
}

/// Appends `_{doc_id}` to the stem of `filename`, keeping the `.pdf` suffix.
#[must_use]
pub(crate) fn disambiguate(filename: &str, doc_id: &str) -> String {
    let stem = if has_pdf_extension(filename) {
        &filename[..filename.len() - 4]
    } else {
        filename
    };
    format!("{stem}_{doc_id}.pdf")
}

pub(crate) fn has_pdf_extension(name: &str) -> bool {
    name.len() >= 4
        && name.is_char_boundary(name.len() - 4)
        && name[name.len() - 4..].eq_ignore_ascii_case(".pdf")
}

/// Replaces path separators, reserved and control characters with `_`,
/// collapses whitespace and trims the result.
pub(crate) fn sanitize_filename(name: &str) -> String {
    let collapsed = name.split_whitespace().collect::<Vec<_>>().join(" ");
    let mapped: String = collapsed
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    let capped = truncate_at_char_boundary(&mapped, MAX_STEM_BYTES);
    let trimmed = capped.trim().trim_end_matches('.').trim();

    // Dot-only names would resolve to the destination directory or its parent.
    if trimmed.chars().all(|c| c == '.') {
        return String::new();
    }
    trimmed.to_string()
}

/// Longest prefix of `value` that fits in `max_bytes` without splitting a char.
fn truncate_at_char_boundary(value: &str, max_bytes: usize) -> &str {
    if value.len() <= max_bytes {
        return value;
    }
    let mut end = max_bytes;
    while !value.is_char_boundary(end) {
        end -= 1;
    }
    &value[..end]
}
