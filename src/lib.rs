//! Docbinder: documentation site crawler and binder
//!
//! This crate discovers the pages that make up a documentation website, converts
//! each page into a PDF or Markdown artifact, and assembles the per-page artifacts
//! into a single combined document.

pub mod assemble;
pub mod config;
pub mod crawler;
pub mod extract;
pub mod output;
pub mod pipeline;
pub mod render;
pub mod url;

use thiserror::Error;

/// Main error type for Docbinder operations
#[derive(Debug, Error)]
pub enum DocbinderError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid seed URL: {0}")]
    Scope(#[from] UrlError),

    #[error("No documentation pages found starting from {seed}")]
    NoPages { seed: String },

    #[error("Browser error: {0}")]
    Browser(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),
}

/// URL-specific errors
///
/// Raised for a seed URL that cannot anchor a crawl. Discovered links that fail
/// to parse are dropped silently instead.
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("URL must start with http:// or https://, got scheme '{0}'")]
    InvalidScheme(String),

    #[error("Missing host in URL")]
    MissingHost,
}

/// Result type alias for Docbinder operations
pub type Result<T> = std::result::Result<T, DocbinderError>;

// Re-export commonly used types
pub use config::{Config, OutputFormat, PageFormat};
pub use pipeline::{Pipeline, PipelineObserver, RunOutcome};
pub use crate::url::{normalize_url, parse_seed_url};
