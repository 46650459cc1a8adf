//! Configuration module for Docbinder
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! Every section is optional; command-line flags are layered on top of the file
//! by the binary.
//!
//! # Example
//!
//! ```no_run
//! use docbinder::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("docbinder.toml")).unwrap();
//! println!("Crawler will use max depth: {}", config.crawler.max_depth);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    ClassifierConfig, Config, CrawlerConfig, Engine, OutputConfig, OutputFormat, PageFormat,
    PdfMargins, PdfOptions,
};

// Re-export parser and validation functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash};
pub use validation::{parse_length_inches, validate};
