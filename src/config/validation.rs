use crate::config::types::{
    ClassifierConfig, Config, CrawlerConfig, Engine, OutputConfig, PdfOptions,
};
use crate::ConfigError;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_classifier_config(&config.classifier)?;
    validate_pdf_options(&config.pdf)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    // max_depth >= 0 is always true for u32, so no check needed

    if config.max_pages < 1 {
        return Err(ConfigError::Validation(format!(
            "max_pages must be >= 1, got {}",
            config.max_pages
        )));
    }

    if config.max_concurrent_conversions < 1 || config.max_concurrent_conversions > 32 {
        return Err(ConfigError::Validation(format!(
            "max_concurrent_conversions must be between 1 and 32, got {}",
            config.max_concurrent_conversions
        )));
    }

    if config.discovery_timeout_ms == 0 || config.page_timeout_ms == 0 {
        return Err(ConfigError::Validation(
            "discovery and page timeouts must be greater than zero".to_string(),
        ));
    }

    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }

    Ok(())
}

fn validate_classifier_config(config: &ClassifierConfig) -> Result<(), ConfigError> {
    if config.doc_segments.iter().any(|s| s.trim().is_empty()) {
        return Err(ConfigError::Validation(
            "doc_segments cannot contain empty entries".to_string(),
        ));
    }
    Ok(())
}

/// Validates PDF options: every margin must be a length with a known unit
fn validate_pdf_options(options: &PdfOptions) -> Result<(), ConfigError> {
    let margins = &options.margins;
    for (side, value) in [
        ("top", &margins.top),
        ("bottom", &margins.bottom),
        ("left", &margins.left),
        ("right", &margins.right),
    ] {
        if parse_length_inches(value).is_none() {
            return Err(ConfigError::Validation(format!(
                "margin-{} must be a length such as '20mm', '2cm', '0.5in' or '40px', got '{}'",
                side, value
            )));
        }
    }
    Ok(())
}

fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.engine == Engine::Http && config.format.wants_pdf() {
        return Err(ConfigError::Validation(format!(
            "the http engine cannot capture PDFs; use the browser engine for format '{}'",
            config.format
        )));
    }

    if let Some(name) = &config.final_name {
        if name.trim().is_empty() {
            return Err(ConfigError::Validation(
                "final_name cannot be empty".to_string(),
            ));
        }
    }

    Ok(())
}

/// Parses a CSS-style length (`mm`, `cm`, `in`, `px`) into inches
///
/// A bare number is read as pixels, matching how browsers treat unitless
/// margins. Negative lengths are rejected.
pub fn parse_length_inches(value: &str) -> Option<f64> {
    let value = value.trim().to_ascii_lowercase();
    let split = value
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(value.len());
    let (number, unit) = value.split_at(split);
    let number: f64 = number.parse().ok()?;

    let inches = match unit.trim() {
        "mm" => number / 25.4,
        "cm" => number / 2.54,
        "in" => number,
        "px" | "" => number / 96.0,
        _ => return None,
    };

    Some(inches)
}
