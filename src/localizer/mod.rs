//! Localizer module for mirroring the resources a card references
//!
//! This module contains the core localization logic, including:
//! - Dialect-aware reference scanning
//! - Deterministic naming of localized files
//! - Concurrent downloading with proxy routing
//! - Coordination of the self-feeding scan/download graph
//! - Rewriting the document to point at local copies

mod coordinator;
mod fetcher;
mod paths;
mod pool;
mod rewriter;
mod scanner;

pub use coordinator::{Coordinator, LocalizationRun};
pub use fetcher::{build_http_client, DownloadTask, FetchOutcome, Fetcher};
pub use paths::PathMapper;
pub use pool::{spawn_workers, DownloadResult};
pub use rewriter::walk;
pub use scanner::{scan, Dialect, ScanOutput, ScanTask, ALLOWED_EXTENSIONS};

use crate::card::{decode_card, encode_card};
use crate::config::{Config, NetworkConfig, DEFAULT_MAX_WORKERS, DEFAULT_SERVED_PREFIX};
use crate::output::{LocalizationStats, ProgressLog, ProgressSink, Severity};
use crate::{LocalizerError, PipelineError};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// Where and how a card's resources are localized
#[derive(Debug, Clone)]
pub struct LocalizeOptions {
    /// Public directory; resources go to `<base>/<served prefix>/<character>/`
    pub base_path: PathBuf,

    /// Served-path prefix, such as `/niko/`
    pub served_prefix: String,

    /// Number of concurrent download workers
    pub max_workers: usize,

    /// Proxy and request settings
    pub network: NetworkConfig,

    /// Character name used when the document has none
    pub fallback_name: Option<String>,
}

impl LocalizeOptions {
    /// Creates options with default settings writing under `base_path`
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
            served_prefix: DEFAULT_SERVED_PREFIX.to_string(),
            max_workers: DEFAULT_MAX_WORKERS,
            network: NetworkConfig::default(),
            fallback_name: None,
        }
    }

    /// Creates options from the configuration
    ///
    /// `default_base` is used when the configuration has no base path.
    pub fn from_config(config: &Config, default_base: &Path) -> Self {
        let base_path = config
            .localizer
            .base_path
            .as_ref()
            .map(PathBuf::from)
            .unwrap_or_else(|| default_base.to_path_buf());

        Self {
            base_path,
            served_prefix: config.localizer.served_prefix.clone(),
            max_workers: config.localizer.max_workers,
            network: config.network.clone(),
            fallback_name: None,
        }
    }

    pub fn with_fallback_name(mut self, name: impl Into<String>) -> Self {
        self.fallback_name = Some(name.into());
        self
    }

    /// Returns the mapper for a sanitized character name
    pub fn path_mapper(&self, character: &str) -> PathMapper {
        let output_root = self
            .base_path
            .join(self.served_prefix.trim_matches('/'))
            .join(character);
        PathMapper::new(output_root, &self.served_prefix, character)
    }
}

/// A card whose references were localized
#[derive(Debug, Clone)]
pub struct LocalizedCard {
    /// The new PNG bytes
    pub bytes: Vec<u8>,

    /// The rewritten document embedded in `bytes`
    pub document: Value,

    pub stats: LocalizationStats,

    /// Progress log of the run
    pub log: String,
}

/// A fatal localization error together with the progress log so far
#[derive(Debug, Error)]
#[error("{error}")]
pub struct LocalizeFailure {
    #[source]
    pub error: LocalizerError,
    pub log: String,
}

impl LocalizeFailure {
    /// Returns true if the run ended because the caller raised stop
    pub fn is_stopped(&self) -> bool {
        matches!(
            self.error,
            LocalizerError::Pipeline(PipelineError::StoppedByCaller)
        )
    }
}

/// Result of localizing a card file
#[derive(Debug)]
pub enum CardFileOutcome {
    /// The rewritten card was written to `output_path`
    Localized {
        output_path: PathBuf,
        card: LocalizedCard,
    },

    /// The card references nothing; no file was written
    NothingToLocalize { log: String },
}

/// Lists the references of the document itself, without any network access
///
/// Only the serialized root document is scanned; resources nested in
/// stylesheets or scripts are not discovered.
///
/// # Example
///
/// ```
/// use card_localizer::discover_references;
/// use serde_json::json;
///
/// let document = json!({"avatar": "https://example.com/a.png", "doc": "https://example.com/x.pdf"});
/// assert_eq!(discover_references(&document).unwrap(), vec!["https://example.com/a.png"]);
/// ```
pub fn discover_references(document: &Value) -> Result<Vec<String>, PipelineError> {
    let text = serde_json::to_string(document)?;
    Ok(scan(&ScanTask::new(text, Dialect::Json))
        .urls
        .into_iter()
        .collect())
}

/// Localizes the references of a PNG card
///
/// The progress log is returned on success and on failure.
///
/// # Arguments
///
/// * `png` - Original card bytes
/// * `options` - Output location and network settings
/// * `sink` - Receives progress messages as they happen
/// * `stop` - Cancelling this token stops the run
pub async fn localize_card(
    png: &[u8],
    options: LocalizeOptions,
    sink: Arc<dyn ProgressSink>,
    stop: CancellationToken,
) -> Result<LocalizedCard, LocalizeFailure> {
    let log = Arc::new(ProgressLog::new(sink));

    match run_localization(png, options, log.clone(), stop).await {
        Ok((bytes, run)) => Ok(LocalizedCard {
            bytes,
            document: run.document,
            stats: run.stats,
            log: log.contents(),
        }),
        Err(error) => Err(fail(&log, error)),
    }
}

async fn run_localization(
    png: &[u8],
    options: LocalizeOptions,
    sink: Arc<dyn ProgressSink>,
    stop: CancellationToken,
) -> Result<(Vec<u8>, LocalizationRun), LocalizerError> {
    let document = decode_card(png)?;
    let mut coordinator = Coordinator::new(document, options, sink)?.with_stop_token(stop);
    let run = coordinator.run().await?;
    let bytes = encode_card(png, &run.document)?;
    Ok((bytes, run))
}

/// Localizes a card file and writes the result next to it
///
/// The rewritten card goes to `<card dir>/<output-dir-name>/<file name>`.
/// Resources go under the configured base path, or the card's directory when
/// none is configured. A card without references is left untouched.
pub async fn localize_card_file(
    card_path: &Path,
    config: &Config,
    sink: Arc<dyn ProgressSink>,
    stop: CancellationToken,
) -> Result<CardFileOutcome, LocalizeFailure> {
    let log = Arc::new(ProgressLog::new(sink));

    let card_dir = card_path.parent().unwrap_or_else(|| Path::new(""));
    let Some(file_name) = card_path.file_name() else {
        let error = std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("{} is not a file path", card_path.display()),
        );
        return Err(fail(&log, error.into()));
    };

    let original = match tokio::fs::read(card_path).await {
        Ok(bytes) => bytes,
        Err(e) => return Err(fail(&log, e.into())),
    };

    let references = match decode_card(&original)
        .and_then(|document| discover_references(&document).map_err(LocalizerError::from))
    {
        Ok(references) => references,
        Err(e) => return Err(fail(&log, e)),
    };

    if references.is_empty() {
        log.report(
            "No external references found; card left unchanged",
            Severity::Info,
        );
        return Ok(CardFileOutcome::NothingToLocalize {
            log: log.contents(),
        });
    }
    log.report(
        &format!("Card references {} external resources", references.len()),
        Severity::Info,
    );

    let mut options = LocalizeOptions::from_config(config, card_dir);
    if let Some(stem) = card_path.file_stem() {
        options = options.with_fallback_name(stem.to_string_lossy());
    }

    let mut card = match localize_card(&original, options, log.clone(), stop).await {
        Ok(card) => card,
        Err(failure) => {
            return Err(LocalizeFailure {
                error: failure.error,
                log: log.contents(),
            })
        }
    };

    let output_dir = card_dir.join(&config.localizer.output_dir_name);
    let output_path = output_dir.join(file_name);
    let written = async {
        tokio::fs::create_dir_all(&output_dir).await?;
        tokio::fs::write(&output_path, &card.bytes).await
    }
    .await;
    if let Err(e) = written {
        return Err(fail(&log, e.into()));
    }

    log.report(
        &format!("Saved localized card to {}", output_path.display()),
        Severity::Success,
    );
    card.log = log.contents();

    Ok(CardFileOutcome::Localized { output_path, card })
}

/// Records a fatal error in the log and pairs them up
fn fail(log: &ProgressLog, error: LocalizerError) -> LocalizeFailure {
    let severity = match &error {
        LocalizerError::Pipeline(PipelineError::StoppedByCaller) => Severity::Warning,
        _ => Severity::Failure,
    };
    log.report(&format!("Localization failed: {}", error), severity);

    LocalizeFailure {
        error,
        log: log.contents(),
    }
}
