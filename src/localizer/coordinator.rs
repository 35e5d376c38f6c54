//! Localization coordinator - orchestrates scanning and downloading
//!
//! This module contains the self-feeding task graph of a localization run:
//! - A scan loop turning text into download tasks
//! - A pool of download workers
//! - A result loop recording localized references and rescanning
//!   downloaded stylesheets, scripts and pages
//!
//! The run is over when the pending counter reaches zero. The document is
//! then rewritten with every successfully localized reference.

use super::fetcher::{DownloadTask, FetchOutcome, Fetcher};
use super::paths::PathMapper;
use super::pool::{spawn_workers, DownloadResult};
use super::rewriter::walk;
use super::scanner::{scan, Dialect, ScanTask};
use super::LocalizeOptions;
use crate::card::{character_name, sanitize_character_name};
use crate::config::NetworkConfig;
use crate::output::{LocalizationStats, ProgressSink, Severity};
use crate::state::{PendingCounter, PipelineState, ProcessedSet, ReferenceMap};
use crate::url::{classify_route, extract_domain};
use crate::{LocalizerError, PipelineError};
use chrono::Utc;
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Capacity of the download and result queues
const QUEUE_CAPACITY: usize = 100;

/// Outcome of a completed run
#[derive(Debug, Clone)]
pub struct LocalizationRun {
    /// The document with localized references substituted
    pub document: Value,

    /// Counters collected during the run
    pub stats: LocalizationStats,
}

/// State shared by the loops of one run
struct RunContext {
    mapper: PathMapper,
    network: NetworkConfig,
    processed: ProcessedSet,
    references: ReferenceMap,
    pending: PendingCounter,
    stop: CancellationToken,
    sink: Arc<dyn ProgressSink>,
}

impl RunContext {
    fn download_task(&self, url: String, dialect: Dialect) -> DownloadTask {
        let (physical_path, public_path) = self.mapper.map_paths(&url, dialect);
        let host = Url::parse(&url)
            .ok()
            .and_then(|parsed| extract_domain(&parsed))
            .unwrap_or_default();

        DownloadTask {
            route: classify_route(&host, &self.network),
            url,
            physical_path,
            public_path,
        }
    }
}

/// Main localization coordinator structure
///
/// One coordinator localizes one document; its processed set and reference
/// map are never shared with other runs.
pub struct Coordinator {
    document: Value,
    mapper: PathMapper,
    network: NetworkConfig,
    max_workers: usize,
    fetcher: Arc<Fetcher>,
    sink: Arc<dyn ProgressSink>,
    stop: CancellationToken,
    state: PipelineState,
}

impl Coordinator {
    /// Creates a new coordinator instance
    ///
    /// # Arguments
    ///
    /// * `document` - The card document to localize
    /// * `options` - Output location and network settings
    /// * `sink` - Receives progress messages
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Successfully created coordinator
    /// * `Err(LocalizerError)` - The HTTP clients could not be built
    pub fn new(
        document: Value,
        options: LocalizeOptions,
        sink: Arc<dyn ProgressSink>,
    ) -> Result<Self, LocalizerError> {
        let name = character_name(&document)
            .or_else(|| options.fallback_name.clone())
            .unwrap_or_default();
        let character = sanitize_character_name(&name);
        let fetcher = Fetcher::new(&options.network)?;

        Ok(Self {
            mapper: options.path_mapper(&character),
            document,
            network: options.network,
            max_workers: options.max_workers,
            fetcher: Arc::new(fetcher),
            sink,
            stop: CancellationToken::new(),
            state: PipelineState::Idle,
        })
    }

    /// Replaces the stop signal with one owned by the caller
    pub fn with_stop_token(mut self, stop: CancellationToken) -> Self {
        self.stop = stop;
        self
    }

    /// Returns a handle that stops the run when cancelled
    pub fn stop_token(&self) -> CancellationToken {
        self.stop.clone()
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    pub fn path_mapper(&self) -> &PathMapper {
        &self.mapper
    }

    /// Runs the localization to completion
    ///
    /// 1. Seed the scan queue with the serialized document
    /// 2. Spawn the scan loop, the download workers and the result loop
    /// 3. Wait until no scan or download remains (or stop is raised, then drain)
    /// 4. Shut the loops down and join every task
    /// 5. Rewrite the document with the reference map
    ///
    /// # Returns
    ///
    /// * `Ok(LocalizationRun)` - Every reference was attempted
    /// * `Err(PipelineError::StoppedByCaller)` - The stop signal was raised
    /// * `Err(PipelineError)` - The run could not start or a task failed
    pub async fn run(&mut self) -> Result<LocalizationRun, PipelineError> {
        self.transition(PipelineState::Running)?;

        let seed = match serde_json::to_string(&self.document) {
            Ok(seed) => seed,
            Err(e) => {
                self.state = PipelineState::Failed;
                return Err(e.into());
            }
        };

        tracing::info!("Starting localization into {}", self.mapper.output_root().display());
        let stats = LocalizationStats::started_now();

        let context = Arc::new(RunContext {
            mapper: self.mapper.clone(),
            network: self.network.clone(),
            processed: ProcessedSet::new(),
            references: ReferenceMap::new(),
            pending: PendingCounter::new(),
            stop: self.stop.clone(),
            sink: Arc::clone(&self.sink),
        });

        // The scan queue is unbounded: the result loop feeds it and must
        // never block while workers wait on the result queue
        let (scan_tx, scan_rx) = mpsc::unbounded_channel::<ScanTask>();
        let (download_tx, download_rx) = mpsc::channel::<DownloadTask>(QUEUE_CAPACITY);
        let (result_tx, result_rx) = mpsc::channel::<DownloadResult>(QUEUE_CAPACITY);
        let shutdown = CancellationToken::new();

        context.pending.increment();
        if scan_tx.send(ScanTask::new(seed, Dialect::Json)).is_err() {
            context.pending.decrement();
        }

        let workers = spawn_workers(
            self.max_workers,
            download_rx,
            Arc::clone(&self.fetcher),
            result_tx,
            self.stop.clone(),
        );
        let scanner = tokio::spawn(scan_loop(
            scan_rx,
            scan_tx.clone(),
            download_tx,
            Arc::clone(&context),
            shutdown.clone(),
        ));
        let results = tokio::spawn(result_loop(
            result_rx,
            scan_tx,
            stats,
            Arc::clone(&context),
            shutdown.clone(),
        ));

        tokio::select! {
            _ = context.pending.wait_for_zero() => {}
            _ = self.stop.cancelled() => {
                context.sink.report("Stop requested; draining queued work", Severity::Warning);
            }
        }

        self.transition(PipelineState::Draining)?;
        context.pending.wait_for_zero().await;
        shutdown.cancel();

        let joined = async {
            let discovered = scanner.await?;
            let stats = results.await?;
            for worker in workers {
                worker.await?;
            }
            Ok::<_, tokio::task::JoinError>((discovered, stats))
        }
        .await;

        let (discovered, mut stats) = match joined {
            Ok(joined) => joined,
            Err(e) => {
                tracing::error!("Localization task failed: {}", e);
                self.state = PipelineState::Failed;
                return Err(PipelineError::TaskFailure(e.to_string()));
            }
        };
        stats.discovered = discovered;
        stats.finished_at = Some(Utc::now());

        if self.stop.is_cancelled() {
            self.transition(PipelineState::Stopped)?;
            self.sink.report(
                &format!(
                    "Localization stopped: {} of {} references localized",
                    stats.succeeded(),
                    stats.discovered
                ),
                Severity::Warning,
            );
            return Err(PipelineError::StoppedByCaller);
        }

        self.transition(PipelineState::Completed)?;
        let document = walk(&self.document, &context.references.snapshot());

        let severity = if stats.failed > 0 {
            Severity::Warning
        } else {
            Severity::Info
        };
        self.sink.report(&stats.summary_line(), severity);
        tracing::info!(
            "Localization completed: {} downloaded, {} reused, {} failed",
            stats.downloaded,
            stats.reused,
            stats.failed
        );

        Ok(LocalizationRun { document, stats })
    }

    fn transition(&mut self, next: PipelineState) -> Result<(), PipelineError> {
        if !self.state.can_transition_to(next) {
            return Err(PipelineError::TaskFailure(format!(
                "invalid state transition {} -> {}",
                self.state, next
            )));
        }
        tracing::debug!("Pipeline state {} -> {}", self.state, next);
        self.state = next;
        Ok(())
    }
}

/// Scans queued text and schedules every newly seen reference
///
/// Returns the number of download tasks scheduled.
async fn scan_loop(
    mut scan_rx: mpsc::UnboundedReceiver<ScanTask>,
    scan_tx: mpsc::UnboundedSender<ScanTask>,
    download_tx: mpsc::Sender<DownloadTask>,
    context: Arc<RunContext>,
    shutdown: CancellationToken,
) -> u64 {
    let mut discovered = 0;

    loop {
        let task = tokio::select! {
            biased;
            _ = shutdown.cancelled() => break,
            task = scan_rx.recv() => match task {
                Some(task) => task,
                None => break,
            },
        };

        // After a stop, queued text is dropped unscanned
        if context.stop.is_cancelled() {
            context.pending.decrement();
            continue;
        }

        let output = scan(&task);

        for nested in output.nested {
            context.pending.increment();
            if scan_tx.send(nested).is_err() {
                context.pending.decrement();
            }
        }

        let mut scheduled = 0;
        for url in output.urls {
            if !context.processed.insert_new(&url) {
                continue;
            }

            let download = context.download_task(url, task.dialect);
            tracing::debug!("Scheduling {} -> {}", download.url, download.public_path);

            context.pending.increment();
            if download_tx.send(download).await.is_err() {
                context.pending.decrement();
                continue;
            }
            scheduled += 1;
        }

        if scheduled > 0 {
            context.sink.report(
                &format!("Found {} new references in {} content", scheduled, task.dialect),
                Severity::Info,
            );
        }
        discovered += scheduled;

        context.pending.decrement();
    }

    discovered
}

/// Records download outcomes and feeds downloaded text back to the scanner
async fn result_loop(
    mut result_rx: mpsc::Receiver<DownloadResult>,
    scan_tx: mpsc::UnboundedSender<ScanTask>,
    mut stats: LocalizationStats,
    context: Arc<RunContext>,
    shutdown: CancellationToken,
) -> LocalizationStats {
    loop {
        let DownloadResult { task, outcome } = tokio::select! {
            biased;
            _ = shutdown.cancelled() => break,
            result = result_rx.recv() => match result {
                Some(result) => result,
                None => break,
            },
        };

        match outcome {
            FetchOutcome::Fetched {
                content,
                from_cache,
            } => {
                context
                    .references
                    .insert(task.url.clone(), task.public_path.clone());

                if from_cache {
                    stats.reused += 1;
                } else {
                    stats.downloaded += 1;
                }
                context.sink.report(
                    &format!("Localized {} -> {}", task.url, task.public_path),
                    Severity::Success,
                );

                if !context.stop.is_cancelled() {
                    if let Some(dialect) = rescan_dialect(&task.physical_path) {
                        context.pending.increment();
                        let text = String::from_utf8_lossy(&content).into_owned();
                        if scan_tx.send(ScanTask::new(text, dialect)).is_err() {
                            context.pending.decrement();
                        }
                    }
                }
            }
            FetchOutcome::Failed(error) => {
                stats.failed += 1;
                stats.failed_urls.push(task.url.clone());
                context.sink.report(
                    &format!("Failed to localize {}: {}", task.url, error),
                    Severity::Failure,
                );
            }
            FetchOutcome::Skipped => {
                tracing::debug!("Skipped {} after stop", task.url);
            }
        }

        context.pending.decrement();
    }

    stats
}

/// Dialect used to rescan a stored resource, by its file extension
fn rescan_dialect(path: &Path) -> Option<Dialect> {
    let extension = path.extension()?.to_string_lossy().to_lowercase();
    Dialect::for_extension(&format!(".{}", extension))
}
