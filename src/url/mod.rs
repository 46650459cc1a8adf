//! URL handling module for Docbinder
//!
//! This module provides URL normalization, seed validation, host comparison and
//! the filename scheme used for per-page artifacts.

mod domain;
mod normalize;
mod slug;

// Re-export main functions
pub use domain::{domain_label, extract_domain, same_site, site_key};
pub use normalize::{normalize_parsed, normalize_url, parse_seed_url};
pub use slug::{artifact_file_name, sanitize_filename, MAX_SLUG_LEN};
