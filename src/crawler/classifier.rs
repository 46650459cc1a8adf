//! Link classification
//!
//! Decides, for every link found on a crawled page, whether it belongs to the
//! documentation being collected and whether it should be trusted as part of
//! the site's table of contents.

use crate::config::ClassifierConfig;
use crate::url::{normalize_parsed, same_site};
use std::collections::HashSet;
use url::Url;

/// Extensions that never identify a documentation page
const DENY_EXTENSIONS: &[&str] = &[
    // images
    "png", "jpg", "jpeg", "gif", "svg", "webp", "ico", "bmp", "tif", "tiff", "avif",
    // archives
    "zip", "tar", "gz", "tgz", "bz2", "xz", "7z", "rar",
    // stylesheets and scripts
    "css", "js", "mjs", "map",
    // data files
    "json", "xml", "csv", "yaml", "yml", "txt", "pdf",
    // fonts
    "woff", "woff2", "ttf", "otf", "eot",
    // media
    "mp3", "mp4", "webm", "ogg", "wav", "mov", "avi",
    // binaries
    "exe", "dmg", "pkg", "deb", "rpm", "msi", "bin", "iso", "apk", "wasm",
];

/// Extensions served as HTML pages
const HTML_EXTENSIONS: &[&str] = &["html", "htm", "xhtml", "shtml"];

/// Path substrings that mark account or action endpoints
const BLOCKED_SUBSTRINGS: &[&str] = &[
    "login", "signup", "search", "auth", "download", "callback", "register",
];

/// Outcome of classifying one link
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// Worth crawling; `priority` links skip the path heuristic and the frontier cap
    Accept { priority: bool },
    Reject(RejectReason),
}

impl Classification {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accept { .. })
    }
}

/// Why a link was not accepted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    CrossSite,
    DeniedExtension,
    BlockedPath,
    NotAPage,
    NotDocumentation,
}

/// Documentation-path vocabulary
///
/// A path matches when one of its segments equals a vocabulary word, or when a
/// segment split on `-` and `_` contains one (`/api-reference/` matches `api`).
#[derive(Debug, Clone)]
pub struct PathPolicy {
    segments: HashSet<String>,
}

impl PathPolicy {
    pub fn new<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            segments: segments
                .into_iter()
                .map(|s| s.as_ref().trim().to_ascii_lowercase())
                .filter(|s| !s.is_empty())
                .collect(),
        }
    }

    pub fn matches(&self, path: &str) -> bool {
        path.to_ascii_lowercase()
            .split('/')
            .filter(|segment| !segment.is_empty())
            .any(|segment| {
                self.segments.contains(segment)
                    || segment
                        .split(|c| c == '-' || c == '_')
                        .any(|token| self.segments.contains(token))
            })
    }
}

/// Classifies candidate links relative to a seed URL
#[derive(Debug, Clone)]
pub struct LinkClassifier {
    seed: Url,
    deny_extensions: HashSet<String>,
    blocked_substrings: Vec<String>,
    policy: PathPolicy,
}

impl LinkClassifier {
    /// Builds a classifier scoped to the host of `seed`
    ///
    /// The seed is stored normalized; it is the identity discovery reports first.
    pub fn new(seed: Url, config: &ClassifierConfig) -> Self {
        let deny_extensions = DENY_EXTENSIONS
            .iter()
            .map(|e| e.to_string())
            .chain(
                config
                    .extra_deny_extensions
                    .iter()
                    .map(|e| e.trim_start_matches('.').to_ascii_lowercase()),
            )
            .collect();

        let blocked_substrings = BLOCKED_SUBSTRINGS
            .iter()
            .map(|s| s.to_string())
            .chain(
                config
                    .extra_blocked_substrings
                    .iter()
                    .map(|s| s.to_ascii_lowercase()),
            )
            .collect();

        Self {
            seed: normalize_parsed(&seed),
            deny_extensions,
            blocked_substrings,
            policy: PathPolicy::new(&config.doc_segments),
        }
    }

    pub fn seed(&self) -> &Url {
        &self.seed
    }

    /// Classifies a normalized link found on a page at `source_depth`
    ///
    /// `from_navigation` is true when the link sat inside the page's detected
    /// navigation region. Rules apply in order; the first rejection wins.
    ///
    /// # Examples
    ///
    /// ```
    /// use docbinder::config::ClassifierConfig;
    /// use docbinder::crawler::{Classification, LinkClassifier};
    /// use url::Url;
    ///
    /// let seed = Url::parse("https://docs.example.com/").unwrap();
    /// let classifier = LinkClassifier::new(seed, &ClassifierConfig::default());
    ///
    /// let nav_link = Url::parse("https://docs.example.com/intro").unwrap();
    /// assert_eq!(
    ///     classifier.classify(&nav_link, 0, true),
    ///     Classification::Accept { priority: true }
    /// );
    ///
    /// let blog = Url::parse("https://docs.example.com/blog/news").unwrap();
    /// assert!(!classifier.classify(&blog, 1, false).is_accepted());
    /// ```
    pub fn classify(&self, candidate: &Url, source_depth: u32, from_navigation: bool) -> Classification {
        if !same_site(candidate, &self.seed) {
            return Classification::Reject(RejectReason::CrossSite);
        }

        let path = candidate.path().to_ascii_lowercase();
        let extension = final_segment_extension(&path);

        if let Some(ext) = extension {
            if self.deny_extensions.contains(ext) {
                return Classification::Reject(RejectReason::DeniedExtension);
            }
        }

        if self.blocked_substrings.iter().any(|s| path.contains(s.as_str())) {
            return Classification::Reject(RejectReason::BlockedPath);
        }

        let page_like = match extension {
            None => true,
            Some(ext) => HTML_EXTENSIONS.contains(&ext) || path.ends_with('/'),
        };
        if !page_like {
            return Classification::Reject(RejectReason::NotAPage);
        }

        if source_depth == 0 {
            return Classification::Accept {
                priority: from_navigation,
            };
        }

        if self.policy.matches(&path) {
            Classification::Accept { priority: false }
        } else {
            Classification::Reject(RejectReason::NotDocumentation)
        }
    }
}

/// Extension of the last path segment, if it has one
fn final_segment_extension(path: &str) -> Option<&str> {
    let last = path.rsplit('/').next().unwrap_or("");
    match last.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => Some(ext),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classifier() -> LinkClassifier {
        LinkClassifier::new(
            Url::parse("https://docs.example.com/").unwrap(),
            &ClassifierConfig::default(),
        )
    }

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_rejects_cross_site() {
        let c = classifier();
        assert_eq!(
            c.classify(&url("https://other.com/docs/x"), 0, true),
            Classification::Reject(RejectReason::CrossSite)
        );
        assert_eq!(
            c.classify(&url("https://docs.example.com:8443/docs"), 0, true),
            Classification::Reject(RejectReason::CrossSite)
        );
    }

    #[test]
    fn test_rejects_asset_extensions() {
        let c = classifier();
        for path in ["/logo.png", "/docs/bundle.js", "/docs/style.CSS", "/docs/data.json", "/docs/guide.pdf"] {
            let link = url(&format!("https://docs.example.com{}", path));
            assert_eq!(
                c.classify(&link, 0, true),
                Classification::Reject(RejectReason::DeniedExtension),
                "{}",
                path
            );
        }
    }

    #[test]
    fn test_rejects_action_endpoints() {
        let c = classifier();
        for path in ["/login", "/docs/search", "/oauth/callback", "/signup/", "/downloads/latest"] {
            let link = url(&format!("https://docs.example.com{}", path));
            assert_eq!(
                c.classify(&link, 0, true),
                Classification::Reject(RejectReason::BlockedPath),
                "{}",
                path
            );
        }
    }

    #[test]
    fn test_accepts_page_like_paths() {
        let c = classifier();
        assert!(c.classify(&url("https://docs.example.com/intro"), 0, false).is_accepted());
        assert!(c.classify(&url("https://docs.example.com/intro.html"), 0, false).is_accepted());
        assert!(c.classify(&url("https://docs.example.com/intro.HTM"), 0, false).is_accepted());
        assert!(c.classify(&url("https://docs.example.com/guides/"), 0, false).is_accepted());
    }

    #[test]
    fn test_rejects_unknown_extensions() {
        let c = classifier();
        assert_eq!(
            c.classify(&url("https://docs.example.com/docs/page.php"), 0, true),
            Classification::Reject(RejectReason::NotAPage)
        );
    }

    #[test]
    fn test_seed_is_stored_normalized() {
        let c = LinkClassifier::new(
            url("https://docs.example.com/?ref=x#top"),
            &ClassifierConfig::default(),
        );
        assert_eq!(c.seed().as_str(), "https://docs.example.com/");
    }

    #[test]
    fn test_depth_zero_navigation_is_priority() {
        let c = classifier();
        let link = url("https://docs.example.com/blog/welcome");
        assert_eq!(c.classify(&link, 0, true), Classification::Accept { priority: true });
        assert_eq!(c.classify(&link, 0, false), Classification::Accept { priority: false });
    }

    #[test]
    fn test_deeper_links_need_doc_path() {
        let c = classifier();
        assert_eq!(
            c.classify(&url("https://docs.example.com/blog/welcome"), 1, false),
            Classification::Reject(RejectReason::NotDocumentation)
        );
        assert!(c.classify(&url("https://docs.example.com/docs/install"), 1, false).is_accepted());
        assert!(c.classify(&url("https://docs.example.com/api-reference/types"), 2, false).is_accepted());
        assert_eq!(
            c.classify(&url("https://docs.example.com/docs/install"), 1, false),
            Classification::Accept { priority: false }
        );
    }

    #[test]
    fn test_path_policy_tokens() {
        let policy = PathPolicy::new(["docs", "Guide"]);
        assert!(policy.matches("/en/docs/start"));
        assert!(policy.matches("/user_guide/"));
        assert!(policy.matches("/GUIDE"));
        assert!(!policy.matches("/documents/x"));
        assert!(!policy.matches("/"));
    }

    #[test]
    fn test_configured_extensions_and_substrings() {
        let config = ClassifierConfig {
            doc_segments: vec!["handbook".to_string()],
            extra_deny_extensions: vec![".md".to_string()],
            extra_blocked_substrings: vec!["Changelog".to_string()],
        };
        let c = LinkClassifier::new(url("https://docs.example.com/"), &config);

        assert_eq!(
            c.classify(&url("https://docs.example.com/readme.md"), 0, true),
            Classification::Reject(RejectReason::DeniedExtension)
        );
        assert_eq!(
            c.classify(&url("https://docs.example.com/changelog/"), 0, true),
            Classification::Reject(RejectReason::BlockedPath)
        );
        assert!(c.classify(&url("https://docs.example.com/handbook/a"), 1, false).is_accepted());
        assert!(!c.classify(&url("https://docs.example.com/docs/a"), 1, false).is_accepted());
    }

    #[test]
    fn test_final_segment_extension() {
        assert_eq!(final_segment_extension("/a/b.html"), Some("html"));
        assert_eq!(final_segment_extension("/a.b/c"), None);
        assert_eq!(final_segment_extension("/a/.hidden"), None);
        assert_eq!(final_segment_extension("/"), None);
    }
}
