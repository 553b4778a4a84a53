//! Heading and key normalization.

/// Key used when a heading normalizes to nothing.
pub const UNNAMED_SECTION: &str = "unnamed_section";

/// Turn free text into a `lower_snake_case` identifier.
///
/// Whitespace and underscore runs become one `_`, anything that is not an
/// ASCII letter or digit is dropped, and the result never starts or ends
/// with `_`. May return an empty string.
pub fn normalize_identifier(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pending_separator = false;

    for ch in text.chars() {
        if ch.is_whitespace() || ch == '_' {
            pending_separator = true;
        } else if ch.is_ascii_alphanumeric() {
            if pending_separator && !out.is_empty() {
                out.push('_');
            }
            pending_separator = false;
            out.push(ch.to_ascii_lowercase());
        }
    }

    out
}

/// Section key for a heading, falling back to [`UNNAMED_SECTION`].
pub fn section_key(heading: &str) -> String {
    let key = normalize_identifier(heading);
    if key.is_empty() {
        UNNAMED_SECTION.to_string()
    } else {
        key
    }
}

/// Key for a key-value pair; `None` when nothing usable is left.
pub fn pair_key(raw: &str) -> Option<String> {
    let key = normalize_identifier(raw);
    (!key.is_empty()).then_some(key)
}
