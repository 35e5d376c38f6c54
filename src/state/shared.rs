//! Concurrent state shared by the coordinator loops and download workers

use dashmap::{DashMap, DashSet};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::Notify;

/// URLs already scheduled for download during one run
#[derive(Debug, Default)]
pub struct ProcessedSet {
    urls: DashSet<String>,
}

impl ProcessedSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Atomically marks `url` as scheduled
    ///
    /// Returns true only for the first caller; every later call for the same
    /// URL returns false.
    pub fn insert_new(&self, url: &str) -> bool {
        self.urls.insert(url.to_string())
    }

    pub fn contains(&self, url: &str) -> bool {
        self.urls.contains(url)
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }
}

/// Localized URLs mapped to the public paths that replace them
///
/// Entries are only ever added during a run.
#[derive(Debug, Default)]
pub struct ReferenceMap {
    entries: DashMap<String, String>,
}

impl ReferenceMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records that `url` is now served at `public_path`
    pub fn insert(&self, url: impl Into<String>, public_path: impl Into<String>) {
        self.entries.insert(url.into(), public_path.into());
    }

    pub fn get(&self, url: &str) -> Option<String> {
        self.entries.get(url).map(|entry| entry.value().clone())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Copies the current entries into a plain map
    pub fn snapshot(&self) -> HashMap<String, String> {
        self.entries
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect()
    }
}

/// Count of scan and download units that have not finished yet
///
/// The run is quiescent when the count returns to zero. Every increment must
/// happen before the unit it accounts for is handed to another task.
#[derive(Debug, Default)]
pub struct PendingCounter {
    count: AtomicUsize,
    zero: Notify,
}

impl PendingCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment(&self) {
        self.count.fetch_add(1, Ordering::SeqCst);
    }

    /// Marks one unit finished and wakes waiters when none remain
    pub fn decrement(&self) {
        let previous = self
            .count
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));

        match previous {
            Ok(1) => self.zero.notify_waiters(),
            Ok(_) => {}
            Err(_) => tracing::warn!("Pending counter decremented below zero"),
        }
    }

    pub fn get(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }

    /// Waits until the count is zero
    ///
    /// Returns immediately if it already is.
    pub async fn wait_for_zero(&self) {
        loop {
            let notified = self.zero.notified();
            tokio::pin!(notified);
            // Register before checking so a concurrent decrement is not missed
            notified.as_mut().enable();

            if self.get() == 0 {
                return;
            }
            notified.await;
        }
    }
}
