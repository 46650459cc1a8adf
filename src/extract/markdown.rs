//! Markdown formatting and the per-page document format

use std::fmt;

/// Converts an HTML fragment to Markdown
///
/// Implementations must be idempotent on input that is already clean text.
pub trait MarkdownFormatter: Send + Sync {
    fn to_markdown(&self, html: &str) -> String;
}

/// [`MarkdownFormatter`] backed by `html2md`
#[derive(Debug, Default, Clone, Copy)]
pub struct Html2MdFormatter;

impl MarkdownFormatter for Html2MdFormatter {
    fn to_markdown(&self, html: &str) -> String {
        html2md::parse_html(html)
    }
}

/// Normalizes converter output
///
/// - Trailing whitespace is removed from every line
/// - Runs of blank lines collapse to one
/// - Blank lines directly after a closing fence or before a fence are dropped
/// - Leading and trailing blank space is trimmed
///
/// Applying it twice gives the same result as applying it once.
pub fn clean_markdown(content: &str) -> String {
    let mut lines: Vec<&str> = Vec::new();
    for line in content.lines().map(str::trim_end) {
        if line.is_empty() && lines.last().map_or(true, |prev| prev.is_empty()) {
            continue;
        }
        lines.push(line);
    }

    let mut cleaned: Vec<&str> = Vec::with_capacity(lines.len());
    for (i, line) in lines.iter().enumerate() {
        if line.is_empty() {
            let after_fence = cleaned.last().map_or(false, |prev| prev.ends_with("```"));
            let before_fence = lines
                .get(i + 1)
                .map_or(false, |next| next.trim_start().starts_with("```"));
            if after_fence || before_fence {
                continue;
            }
        }
        cleaned.push(line);
    }

    cleaned.join("\n").trim().to_string()
}

/// One page's Markdown file
///
/// ```text
/// ---
/// title: <title>
/// source: <url>
/// ---
///
/// # <title>
///
/// <body>
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageDocument {
    pub title: String,
    pub source: String,
    pub body: String,
}

impl PageDocument {
    /// Reads a document written by [`PageDocument::render`]
    ///
    /// The title is the first `title:` key of the header block. Files without
    /// a header are accepted: the whole text becomes the body and the title is
    /// taken from a leading `# ` heading when there is one.
    pub fn parse(text: &str) -> Self {
        let (header, content) = split_header(text);

        let key = |name: &str| {
            header.as_deref().and_then(|header| {
                header.lines().find_map(|line| {
                    line.strip_prefix(name)
                        .and_then(|rest| rest.strip_prefix(':'))
                        .map(|value| value.trim().to_string())
                })
            })
        };

        let content = content.trim_start_matches(['\n', '\r']);
        let (heading, rest) = match content.split_once('\n') {
            Some((first, rest)) if first.starts_with("# ") => (Some(first[2..].trim()), rest),
            None if content.starts_with("# ") => (Some(content[2..].trim()), ""),
            _ => (None, content),
        };

        let title = key("title")
            .or_else(|| heading.map(str::to_string))
            .unwrap_or_else(|| crate::extract::UNTITLED.to_string());

        // Drop the heading that repeats the title
        let body = match heading {
            Some(h) if h == title => rest,
            _ => content,
        };

        Self {
            title,
            source: key("source").unwrap_or_default(),
            body: body.trim().to_string(),
        }
    }

    /// Serializes the document with its metadata header
    pub fn render(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for PageDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let title = single_line(&self.title);
        writeln!(f, "---")?;
        writeln!(f, "title: {}", title)?;
        writeln!(f, "source: {}", self.source)?;
        writeln!(f, "---")?;
        writeln!(f)?;
        writeln!(f, "# {}", title)?;
        writeln!(f)?;
        writeln!(f, "{}", self.body)
    }
}

/// Splits a leading `---` block from the rest of the text
fn split_header(text: &str) -> (Option<String>, &str) {
    let mut lines = text.split_inclusive('\n');
    match lines.next() {
        Some(first) if first.trim() == "---" => {}
        _ => return (None, text),
    }

    let mut consumed = text.split_inclusive('\n').next().map_or(0, str::len);
    let mut header = String::new();
    for line in lines {
        consumed += line.len();
        if line.trim() == "---" {
            return (Some(header), &text[consumed..]);
        }
        header.push_str(line);
    }

    // Unterminated header: treat everything as content
    (None, text)
}

fn single_line(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
