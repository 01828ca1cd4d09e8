use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

/// Slug used when a title yields no alphanumeric characters at all.
pub const FALLBACK_SLUG: &str = "bai-viet";

/// Derive a URL-safe slug from a post title: lowercase, NFD-decompose and
/// drop combining marks, collapse every other character run into a single
/// `-`, and trim separators from both ends. Deterministic and idempotent.
pub fn slugify(title: &str) -> String {
    let lowered = title.trim().to_lowercase();
    let mut slug = String::with_capacity(lowered.len());
    for ch in lowered.nfd() {
        if is_combining_mark(ch) {
            continue;
        }
        if ch.is_ascii_alphanumeric() {
            slug.push(ch);
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    let slug = slug.trim_end_matches('-');
    if slug.is_empty() {
        FALLBACK_SLUG.to_string()
    } else {
        slug.to_string()
    }
}
