use serde::Deserialize;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration structure for Docbinder
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub crawler: CrawlerConfig,
    pub classifier: ClassifierConfig,
    pub pdf: PdfOptions,
    pub output: OutputConfig,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct CrawlerConfig {
    /// Maximum link distance from the seed page
    pub max_depth: u32,

    /// Maximum number of pages rendered during discovery
    pub max_pages: usize,

    /// Timeout for a discovery fetch (milliseconds)
    pub discovery_timeout_ms: u64,

    /// Timeout for a conversion render (milliseconds)
    pub page_timeout_ms: u64,

    /// Time allowed for the network to go quiet after load (milliseconds)
    pub settle_ms: u64,

    /// Maximum number of pages converted at the same time
    pub max_concurrent_conversions: usize,

    /// User agent sent with every request
    pub user_agent: String,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_depth: 1,
            max_pages: 200,
            discovery_timeout_ms: 20_000,
            page_timeout_ms: 60_000,
            settle_ms: 5_000,
            max_concurrent_conversions: 4,
            user_agent: format!("docbinder/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl CrawlerConfig {
    pub fn discovery_timeout(&self) -> Duration {
        Duration::from_millis(self.discovery_timeout_ms)
    }

    pub fn page_timeout(&self) -> Duration {
        Duration::from_millis(self.page_timeout_ms)
    }

    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }
}

/// Link classifier tuning
///
/// The documentation-path vocabulary is a policy, not a contract: sites that
/// keep their docs under other names can extend it here.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ClassifierConfig {
    /// Path segments that mark a documentation page
    pub doc_segments: Vec<String>,

    /// Extensions rejected in addition to the built-in deny list
    pub extra_deny_extensions: Vec<String>,

    /// Path substrings rejected in addition to the built-in list
    pub extra_blocked_substrings: Vec<String>,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            doc_segments: [
                "docs",
                "doc",
                "documentation",
                "guide",
                "guides",
                "api",
                "reference",
                "manual",
                "tutorial",
                "tutorials",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            extra_deny_extensions: Vec::new(),
            extra_blocked_substrings: Vec::new(),
        }
    }
}

/// Which combined artifacts a run produces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Pdf,
    Markdown,
    Both,
}

impl OutputFormat {
    pub fn wants_pdf(&self) -> bool {
        matches!(self, Self::Pdf | Self::Both)
    }

    pub fn wants_markdown(&self) -> bool {
        matches!(self, Self::Markdown | Self::Both)
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Pdf => "pdf",
            Self::Markdown => "markdown",
            Self::Both => "both",
        };
        f.write_str(name)
    }
}

/// Page rendering engine used for conversion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Engine {
    /// Headless Chromium: executes scripts, required for PDF output
    #[default]
    Browser,
    /// Plain HTTP fetch: Markdown output only
    Http,
}

/// Output configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct OutputConfig {
    pub format: OutputFormat,

    /// Directory for per-page artifacts (defaults to a name derived from the host)
    pub output_dir: Option<PathBuf>,

    /// File name of the combined PDF (defaults to `<host>_documentation.pdf`)
    pub final_name: Option<String>,

    pub engine: Engine,
}

/// Paper sizes accepted for PDF capture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
pub enum PageFormat {
    A0,
    A1,
    A2,
    A3,
    #[default]
    A4,
    A5,
    A6,
    Letter,
    Legal,
    Tabloid,
    Ledger,
}

impl PageFormat {
    /// Paper width and height in inches
    pub fn dimensions_inches(&self) -> (f64, f64) {
        match self {
            Self::A0 => (33.11, 46.81),
            Self::A1 => (23.39, 33.11),
            Self::A2 => (16.54, 23.39),
            Self::A3 => (11.69, 16.54),
            Self::A4 => (8.27, 11.69),
            Self::A5 => (5.83, 8.27),
            Self::A6 => (4.13, 5.83),
            Self::Letter => (8.5, 11.0),
            Self::Legal => (8.5, 14.0),
            Self::Tabloid => (11.0, 17.0),
            Self::Ledger => (17.0, 11.0),
        }
    }
}

/// Page margins, each a length with unit such as `20mm` or `0.5in`
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PdfMargins {
    pub top: String,
    pub bottom: String,
    pub left: String,
    pub right: String,
}

impl Default for PdfMargins {
    fn default() -> Self {
        Self {
            top: "20mm".to_string(),
            bottom: "20mm".to_string(),
            left: "20mm".to_string(),
            right: "20mm".to_string(),
        }
    }
}

/// Options handed to the PDF sink for every page
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct PdfOptions {
    pub page_format: PageFormat,
    pub print_background: bool,
    pub margins: PdfMargins,
}

impl Default for PdfOptions {
    fn default() -> Self {
        Self {
            page_format: PageFormat::A4,
            print_background: true,
            margins: PdfMargins::default(),
        }
    }
}
