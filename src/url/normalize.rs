use crate::UrlError;
use url::Url;

/// Normalizes a URL into its crawl identity
///
/// # Normalization Steps
///
/// 1. Parse the URL; reject if malformed or relative
/// 2. Require an HTTP or HTTPS scheme and a host
/// 3. Lowercase the host and resolve dot segments (done by the parser)
/// 4. Remove the query string
/// 5. Remove the fragment
///
/// Two URLs that differ only by query or fragment normalize to the same value.
/// The path is kept as written, including any trailing slash.
///
/// # Examples
///
/// ```
/// use docbinder::url::normalize_url;
///
/// let url = normalize_url("https://Docs.Example.com/guide/./intro?tab=1#setup").unwrap();
/// assert_eq!(url.as_str(), "https://docs.example.com/guide/intro");
/// ```
pub fn normalize_url(url_str: &str) -> Result<Url, UrlError> {
    let url = Url::parse(url_str.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(url.scheme().to_string()));
    }

    if url.host_str().map_or(true, str::is_empty) {
        return Err(UrlError::MissingHost);
    }

    Ok(normalize_parsed(&url))
}

/// Strips query and fragment from an already-parsed URL
pub fn normalize_parsed(url: &Url) -> Url {
    let mut normalized = url.clone();
    normalized.set_query(None);
    normalized.set_fragment(None);
    normalized
}

/// Validates and normalizes the seed URL of a run
///
/// A seed that cannot be normalized is a scope error: nothing is crawled.
pub fn parse_seed_url(seed: &str) -> Result<Url, UrlError> {
    let trimmed = seed.trim();
    if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
        let scheme = trimmed.split_once("://").map_or("", |(s, _)| s);
        return Err(UrlError::InvalidScheme(scheme.to_string()));
    }
    normalize_url(trimmed)
}
