//! Fixed-size pool of download workers
//!
//! Workers share one task receiver and report every task on the result
//! channel, including tasks skipped after a stop request.

use super::fetcher::{DownloadTask, FetchOutcome, Fetcher};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// A finished download task and what happened to it
#[derive(Debug)]
pub struct DownloadResult {
    pub task: DownloadTask,
    pub outcome: FetchOutcome,
}

/// Spawns `workers` download workers
///
/// Each worker exits when the task channel is closed and empty, or when the
/// result channel is gone. Tasks dequeued after `stop` is cancelled are not
/// fetched and are reported as `FetchOutcome::Skipped`.
///
/// # Arguments
///
/// * `workers` - Number of workers to spawn (at least one)
/// * `tasks` - Receiver shared by all workers
/// * `fetcher` - Shared fetcher
/// * `results` - Where outcomes are sent
/// * `stop` - Caller's stop signal
pub fn spawn_workers(
    workers: usize,
    tasks: mpsc::Receiver<DownloadTask>,
    fetcher: Arc<Fetcher>,
    results: mpsc::Sender<DownloadResult>,
    stop: CancellationToken,
) -> Vec<JoinHandle<()>> {
    let tasks = Arc::new(Mutex::new(tasks));

    (0..workers.max(1))
        .map(|id| {
            let tasks = Arc::clone(&tasks);
            let fetcher = Arc::clone(&fetcher);
            let results = results.clone();
            let stop = stop.clone();
            tokio::spawn(worker_loop(id, tasks, fetcher, results, stop))
        })
        .collect()
}

async fn worker_loop(
    id: usize,
    tasks: Arc<Mutex<mpsc::Receiver<DownloadTask>>>,
    fetcher: Arc<Fetcher>,
    results: mpsc::Sender<DownloadResult>,
    stop: CancellationToken,
) {
    loop {
        // Hold the lock only while waiting for the next task
        let next = tasks.lock().await.recv().await;
        let Some(task) = next else {
            break;
        };

        let outcome = if stop.is_cancelled() {
            FetchOutcome::Skipped
        } else {
            tracing::debug!("Worker {} fetching {}", id, task.url);
            fetcher.fetch(&task).await
        };

        if results.send(DownloadResult { task, outcome }).await.is_err() {
            break;
        }
    }

    tracing::debug!("Worker {} exiting", id);
}
