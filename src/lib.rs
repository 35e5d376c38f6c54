//! Card-Localizer: mirrors the remote assets of a character card
//!
//! This crate reads the JSON document embedded in a PNG character card, downloads
//! every external resource the document (transitively) references, rewrites the
//! document to point at the local copies, and writes the document back into a
//! new card while leaving the image data untouched.

pub mod card;
pub mod config;
pub mod container;
pub mod localizer;
pub mod output;
pub mod state;
pub mod url;

use thiserror::Error;

/// Main error type for Card-Localizer operations
#[derive(Debug, Error)]
pub enum LocalizerError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Container error: {0}")]
    Container(#[from] ContainerError),

    #[error("Card payload error: {0}")]
    Card(#[from] CardError),

    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

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

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid domain pattern: {0}")]
    InvalidPattern(String),
}

/// Errors raised while decoding or encoding the PNG chunk stream
///
/// All of these are fatal for the operation that raised them.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ContainerError {
    #[error("Not a PNG file: bad signature")]
    BadSignature,

    #[error("Truncated chunk at byte offset {offset}")]
    TruncatedChunk { offset: usize },

    #[error("CRC mismatch in {chunk_type} chunk: stored {stored:#010x}, computed {computed:#010x}")]
    ChecksumMismatch {
        chunk_type: String,
        stored: u32,
        computed: u32,
    },

    #[error("No character metadata found in card")]
    MetadataNotFound,

    #[error("IEND chunk not found in original image")]
    MissingTerminalChunk,

    #[error("Metadata payload of {len} bytes does not fit in a chunk")]
    PayloadTooLarge { len: usize },
}

/// Errors raised while turning metadata payloads into documents
#[derive(Debug, Error)]
pub enum CardError {
    #[error("Invalid base64 in '{keyword}' payload: {source}")]
    Base64 {
        keyword: &'static str,
        source: base64::DecodeError,
    },

    #[error("Invalid JSON in '{keyword}' payload: {source}")]
    Json {
        keyword: &'static str,
        source: serde_json::Error,
    },

    #[error("Card has no metadata payload")]
    MissingPayload,

    #[error("Card document in '{keyword}' payload is not a JSON object")]
    NotAnObject { keyword: &'static str },

    #[error("Failed to serialize card document: {0}")]
    Serialize(serde_json::Error),
}

/// Per-resource download failures
///
/// These never abort a localization run; the reference simply stays unresolved.
#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("Request to {url} failed: {message}")]
    NetworkFailure { url: String, message: String },

    #[error("Unexpected response status {status} from {url}")]
    NonOkStatus { url: String, status: u16 },

    #[error("Failed to read response body from {url}: {message}")]
    BodyReadFailure { url: String, message: String },

    #[error("Failed to write {path}: {source}")]
    WriteFailure {
        path: String,
        source: std::io::Error,
    },
}

/// Pipeline-level failures
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Localization stopped by caller")]
    StoppedByCaller,

    #[error("Failed to serialize document for scanning: {0}")]
    SerializationFailure(#[from] serde_json::Error),

    #[error("Pipeline task failed: {0}")]
    TaskFailure(String),
}

/// Result type alias for Card-Localizer operations
pub type Result<T> = std::result::Result<T, LocalizerError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for container operations
pub type ContainerResult<T> = std::result::Result<T, ContainerError>;

// Re-export commonly used types
pub use card::{character_name, sanitize_character_name, CardPayloads};
pub use config::Config;
pub use container::{decode, encode, MetadataPayloads};
pub use localizer::{
    discover_references, localize_card, localize_card_file, CardFileOutcome, Coordinator, Dialect,
    LocalizeFailure, LocalizeOptions, LocalizedCard,
};
pub use output::{LocalizationStats, ProgressLog, ProgressSink, Severity};
pub use state::PipelineState;
