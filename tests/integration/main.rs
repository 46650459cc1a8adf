//! Integration tests
//!
//! These tests use wiremock to serve small documentation sites and drive
//! discovery and the conversion pipeline end-to-end over HTTP.

mod crawl_tests;
mod pipeline_tests;
