//! Dialect-aware reference extraction
//!
//! This module turns text into the set of external references worth
//! localizing. It handles:
//! - Picking the extraction patterns for each content dialect
//! - Splitting and cleaning raw pattern matches
//! - Filtering candidates down to downloadable resources
//!
//! Scanning is pure and never fails; text without references yields an empty set.

use crate::url::{is_stylesheet_endpoint, path_extension};
use regex::Regex;
use std::collections::BTreeSet;
use std::fmt;
use std::ops::Range;
use std::sync::LazyLock;
use url::Url;

/// Extensions of resources worth mirroring
pub const ALLOWED_EXTENSIONS: &[&str] = &[
    ".png", ".jpg", ".jpeg", ".gif", ".webp", ".bmp", ".svg", // images
    ".mp3", ".wav", ".ogg", ".m4a", ".flac", ".mid", // audio
    ".mp4", ".webm", ".mov", ".avi", // video
    ".woff", ".woff2", ".ttf", ".otf", // fonts
    ".css", ".js", ".json", ".txt", // text assets
];

static RE_GENERIC: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"https?://(?:(?:[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?\.)+[a-zA-Z]{2,24}|localhost|\d{1,3}(?:\.\d{1,3}){3})(?::\d{1,5})?(?:[/?#][^\s'"`<>()]*)?"#,
    )
    .unwrap()
});
static RE_CSS_URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"url\(['"]?(https?://.*?)['"]?\)"#).unwrap());
static RE_JS_STRING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"['"`](https?://[^'"`\s]+)['"`]"#).unwrap());
static RE_STYLE_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<style[^>]*>(.*?)</style>").unwrap());
static RE_LINE_BREAK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\n\r]+|\\n|\\r").unwrap());

/// The kind of text being scanned
///
/// The dialect decides which patterns are applied and how referenced
/// resources are named on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Dialect {
    /// Serialized card document (the default)
    #[default]
    Json,
    /// HTML markup; `<style>` bodies are rescanned as CSS
    Html,
    /// Stylesheets
    Css,
    /// Scripts
    Js,
}

impl Dialect {
    /// Returns the dialect a downloaded resource is rescanned with
    ///
    /// Only stylesheets, scripts and HTML pages can reference further
    /// resources. The extension is expected lowercased and with its dot.
    pub fn for_extension(extension: &str) -> Option<Self> {
        match extension {
            ".css" => Some(Self::Css),
            ".js" => Some(Self::Js),
            ".html" | ".htm" => Some(Self::Html),
            _ => None,
        }
    }

    /// Returns true if resources found in this dialect use hashed flat names
    pub fn uses_hashed_names(&self) -> bool {
        matches!(self, Self::Html | Self::Css)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Html => "html",
            Self::Css => "css",
            Self::Js => "js",
        }
    }

    /// Extracts qualifying references from `text`
    pub fn extract(&self, text: &str) -> ScanOutput {
        let mut output = ScanOutput::default();

        match self {
            Self::Json => collect_references(&mut output.urls, generic_matches(text)),
            Self::Css => {
                let quoted = RE_CSS_URL
                    .captures_iter(text)
                    .filter_map(|cap| cap.get(1))
                    .map(|m| m.as_str().trim_matches(|c: char| c == '\'' || c == '"'));
                collect_references(&mut output.urls, quoted);
                collect_references(&mut output.urls, generic_matches(text));
            }
            Self::Js => {
                let quoted = RE_JS_STRING
                    .captures_iter(text)
                    .filter_map(|cap| cap.get(1))
                    .map(|m| {
                        m.as_str()
                            .trim_matches(|c: char| c == '\'' || c == '"' || c == '`')
                    });
                collect_references(&mut output.urls, quoted);
            }
            Self::Html => {
                output.nested = style_bodies(text)
                    .into_iter()
                    .map(|css| ScanTask::new(css, Dialect::Css))
                    .collect();

                let remainder = RE_STYLE_BLOCK.replace_all(text, " ");
                collect_references(&mut output.urls, generic_matches(&remainder));
            }
        }

        output
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A unit of text waiting to be scanned
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanTask {
    pub text: String,
    pub dialect: Dialect,
}

impl ScanTask {
    pub fn new(text: impl Into<String>, dialect: Dialect) -> Self {
        Self {
            text: text.into(),
            dialect,
        }
    }
}

/// References found in one piece of text
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ScanOutput {
    /// Cleaned, qualifying URLs in sorted order
    pub urls: BTreeSet<String>,

    /// Embedded content that must be scanned on its own
    pub nested: Vec<ScanTask>,
}

/// Scans a task's text with its dialect
///
/// # Example
///
/// ```
/// use card_localizer::localizer::{scan, Dialect, ScanTask};
///
/// let task = ScanTask::new("background: url('http://example.com/a.png')", Dialect::Css);
/// let output = scan(&task);
/// assert!(output.urls.contains("http://example.com/a.png"));
/// ```
pub fn scan(task: &ScanTask) -> ScanOutput {
    task.dialect.extract(&task.text)
}

fn generic_matches(text: &str) -> impl Iterator<Item = &str> {
    RE_GENERIC.find_iter(text).map(|m| m.as_str())
}

/// Cleans raw matches and keeps the ones worth downloading
fn collect_references<'a>(
    urls: &mut BTreeSet<String>,
    raw_matches: impl Iterator<Item = &'a str>,
) {
    for raw in raw_matches {
        for candidate in split_candidate(raw) {
            if qualifies(candidate) {
                urls.insert(candidate.to_string());
            }
        }
    }
}

/// Splits a raw match on real and escaped line breaks
///
/// Each piece is trimmed of whitespace and a trailing backslash; empty pieces
/// are dropped.
fn split_candidate(raw: &str) -> impl Iterator<Item = &str> {
    RE_LINE_BREAK
        .split(raw)
        .map(|piece| piece.trim().trim_end_matches('\\').trim())
        .filter(|piece| !piece.is_empty())
}

/// Returns true if `candidate` is an http(s) URL of a mirrorable resource
fn qualifies(candidate: &str) -> bool {
    let Ok(url) = Url::parse(candidate) else {
        return false;
    };

    if !matches!(url.scheme(), "http" | "https") {
        return false;
    }

    if url.host_str().map_or(true, str::is_empty) {
        return false;
    }

    if is_stylesheet_endpoint(&url) {
        return true;
    }

    path_extension(&url).is_some_and(|ext| ALLOWED_EXTENSIONS.contains(&ext.as_str()))
}

/// Collects the body of every textual `<style>` block
///
/// Blocks are matched on the raw text, so styles injected from scripts or
/// kept in comments are scanned too.
fn style_bodies(html: &str) -> Vec<String> {
    RE_STYLE_BLOCK
        .captures_iter(html)
        .filter_map(|cap| cap.get(1))
        .map(|body| body.as_str())
        .filter(|css| !css.trim().is_empty())
        .map(str::to_string)
        .collect()
}

/// Byte ranges of every URL-shaped run in `text`
///
/// Runs are split on real and escaped line breaks the same way candidates
/// are, so two references joined by `\n` yield two ranges.
pub(crate) fn reference_spans(text: &str) -> Vec<Range<usize>> {
    let mut spans = Vec::new();
    for m in RE_GENERIC.find_iter(text) {
        let mut piece_start = m.start();
        for brk in RE_LINE_BREAK.find_iter(m.as_str()) {
            spans.push(piece_start..m.start() + brk.start());
            piece_start = m.start() + brk.end();
        }
        spans.push(piece_start..m.end());
    }
    spans
}
