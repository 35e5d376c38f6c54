//! Deterministic naming of localized resources
//!
//! Every reference maps to one physical file under the output root and one
//! public path under the served prefix. The mapping depends only on the URL
//! and the dialect of the text it was found in.

use super::scanner::Dialect;
use crate::url::{is_stylesheet_endpoint, path_extension};
use sha1::{Digest, Sha1};
use std::path::{Path, PathBuf};
use url::Url;

/// Number of hex digits of the URL hash used in generated file names
const HASH_PREFIX_LEN: usize = 12;

/// Extension of generated names when the URL path has none
const DEFAULT_EXTENSION: &str = ".dat";

const IMAGE_EXTENSIONS: &[&str] = &[".png", ".jpg", ".jpeg", ".gif", ".webp", ".bmp", ".svg"];

const MEDIA_EXTENSIONS: &[&str] = &[
    ".mp3", ".wav", ".ogg", ".m4a", ".flac", ".mid", ".mp4", ".webm", ".mov", ".avi",
];

/// Maps reference URLs to their physical and public locations
#[derive(Debug, Clone)]
pub struct PathMapper {
    output_root: PathBuf,
    public_root: String,
}

impl PathMapper {
    /// Creates a mapper for one character
    ///
    /// # Arguments
    ///
    /// * `output_root` - Directory receiving this character's resources
    /// * `served_prefix` - Public prefix, such as `/niko/`
    /// * `character` - Sanitized character name
    pub fn new(output_root: impl Into<PathBuf>, served_prefix: &str, character: &str) -> Self {
        Self {
            output_root: output_root.into(),
            public_root: format!("{}/{}/", served_prefix.trim_end_matches('/'), character),
        }
    }

    pub fn output_root(&self) -> &Path {
        &self.output_root
    }

    /// Returns the `(physical, public)` locations of a reference
    ///
    /// References found in HTML or CSS, and stylesheet-endpoint URLs, get a
    /// hashed name directly under the output root. Everything else keeps its
    /// base name inside an `images`, `media` or `assets` directory.
    ///
    /// # Example
    ///
    /// ```
    /// use card_localizer::localizer::{Dialect, PathMapper};
    ///
    /// let mapper = PathMapper::new("/srv/public/niko/Ann", "/niko/", "Ann");
    /// let (physical, public) = mapper.map_paths("http://example.com/a.png", Dialect::Json);
    /// assert!(physical.ends_with("images/a.png"));
    /// assert_eq!(public, "/niko/Ann/images/a.png");
    /// ```
    pub fn map_paths(&self, url: &str, dialect: Dialect) -> (PathBuf, String) {
        let parsed = Url::parse(url).ok();
        let stylesheet = parsed.as_ref().is_some_and(is_stylesheet_endpoint);
        let extension = parsed.as_ref().and_then(path_extension);

        if stylesheet || dialect.uses_hashed_names() {
            let extension = if stylesheet {
                ".css".to_string()
            } else {
                extension.unwrap_or_else(|| DEFAULT_EXTENSION.to_string())
            };
            return self.locate(None, format!("{}{}", hash_prefix(url), extension));
        }

        let file_name = parsed
            .as_ref()
            .and_then(base_name)
            .unwrap_or_else(|| {
                let extension = extension.unwrap_or_else(|| DEFAULT_EXTENSION.to_string());
                format!("{}{}", hash_prefix(url), extension)
            });

        let category = category_for(&file_name);
        self.locate(Some(category), file_name)
    }

    fn locate(&self, category: Option<&str>, file_name: String) -> (PathBuf, String) {
        match category {
            Some(category) => (
                self.output_root.join(category).join(&file_name),
                format!("{}{}/{}", self.public_root, category, file_name),
            ),
            None => (
                self.output_root.join(&file_name),
                format!("{}{}", self.public_root, file_name),
            ),
        }
    }
}

/// First hex digits of the SHA-1 of the URL text
fn hash_prefix(url: &str) -> String {
    let digest = Sha1::digest(url.as_bytes());
    let mut hex = hex::encode(digest);
    hex.truncate(HASH_PREFIX_LEN);
    hex
}

/// Last path segment, if it is usable as a file name as-is
///
/// Percent-encoded or otherwise unusual names are rejected so that the
/// served path matches the name on disk.
fn base_name(url: &Url) -> Option<String> {
    let last = url.path_segments()?.last()?;

    if last.is_empty() || last == "." || last == ".." {
        return None;
    }

    let safe = last
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_'));

    safe.then(|| last.to_string())
}

/// Directory a file belongs in, by its extension
fn category_for(file_name: &str) -> &'static str {
    let extension = Path::new(file_name)
        .extension()
        .map(|ext| format!(".{}", ext.to_string_lossy().to_lowercase()));

    match extension.as_deref() {
        Some(ext) if IMAGE_EXTENSIONS.contains(&ext) => "images",
        Some(ext) if MEDIA_EXTENSIONS.contains(&ext) => "media",
        _ => "assets",
    }
}
