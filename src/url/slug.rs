//! Artifact file naming
//!
//! Per-page artifacts are named `<ordinal>_<slug>.<ext>` where the ordinal is
//! zero-padded to three digits so that lexical order equals crawl order.

use url::Url;

/// Maximum length of the path-derived part of an artifact file name
pub const MAX_SLUG_LEN: usize = 100;

/// Reduces arbitrary text to a safe filename fragment
///
/// A leading `scheme://host/` is dropped, every run of characters other than
/// alphanumerics, `_` and `-` collapses to a single `_`, leading and trailing
/// separators are trimmed, and the result is truncated to [`MAX_SLUG_LEN`]
/// characters.
///
/// # Examples
///
/// ```
/// use docbinder::url::sanitize_filename;
///
/// assert_eq!(sanitize_filename("hello/world"), "hello_world");
/// assert_eq!(sanitize_filename("https://example.com/path"), "path");
/// ```
pub fn sanitize_filename(name: &str) -> String {
    let name = strip_origin(name);

    let mut sanitized = String::with_capacity(name.len());
    let mut in_separator = false;
    for c in name.chars() {
        if c.is_alphanumeric() || c == '_' || c == '-' {
            sanitized.push(c);
            in_separator = false;
        } else if !in_separator {
            sanitized.push('_');
            in_separator = true;
        }
    }

    sanitized
        .trim_matches(|c| c == '_' || c == '-')
        .chars()
        .take(MAX_SLUG_LEN)
        .collect()
}

/// Builds the artifact file name for the page at `ordinal`
///
/// The root page (empty path) is named `index`.
pub fn artifact_file_name(ordinal: usize, url: &Url, extension: &str) -> String {
    let path = url.path().trim_matches('/');
    let slug = if path.is_empty() {
        String::new()
    } else {
        sanitize_filename(&path.replace('/', "_"))
    };
    let slug = if slug.is_empty() { "index".to_string() } else { slug };
    format!("{:03}_{}.{}", ordinal, slug, extension)
}

fn strip_origin(name: &str) -> &str {
    for scheme in ["https://", "http://"] {
        if let Some(rest) = name.strip_prefix(scheme) {
            return rest.split_once('/').map_or("", |(_, path)| path);
        }
    }
    name
}
