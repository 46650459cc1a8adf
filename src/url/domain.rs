use url::Url;

/// Extracts the lowercase host from a URL
///
/// # Examples
///
/// ```
/// use url::Url;
/// use docbinder::url::extract_domain;
///
/// let url = Url::parse("https://Docs.Example.com/path").unwrap();
/// assert_eq!(extract_domain(&url), Some("docs.example.com".to_string()));
/// ```
pub fn extract_domain(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}

/// Returns the host plus explicit port, the key used for same-site checks
pub fn site_key(url: &Url) -> Option<String> {
    let host = extract_domain(url)?;
    Some(match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host,
    })
}

/// Returns true if both URLs live on the same host and port
pub fn same_site(a: &Url, b: &Url) -> bool {
    match (site_key(a), site_key(b)) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

/// Derives a filesystem-friendly label from the URL's host
///
/// `www.` is dropped and dots become underscores, so `https://www.docs.rs/`
/// yields `docs_rs`. Used for default output directory and file names.
pub fn domain_label(url: &Url) -> String {
    let host = extract_domain(url).unwrap_or_default();
    let host = host.strip_prefix("www.").unwrap_or(&host);
    let label = host.replace('.', "_");
    if label.is_empty() {
        "site".to_string()
    } else {
        label
    }
}
