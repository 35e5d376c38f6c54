//! Statistics for a single localization run

use chrono::{DateTime, Utc};

/// Counters collected while localizing one card
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalizationStats {
    /// When the run started
    pub started_at: DateTime<Utc>,

    /// When the run finished (None while running)
    pub finished_at: Option<DateTime<Utc>>,

    /// Number of distinct references scheduled for download
    pub discovered: u64,

    /// References fetched over the network
    pub downloaded: u64,

    /// References already present in the output directory
    pub reused: u64,

    /// References that could not be localized
    pub failed: u64,

    /// URLs of failed references, in completion order
    pub failed_urls: Vec<String>,
}

impl LocalizationStats {
    /// Creates empty statistics stamped with the current time
    pub fn started_now() -> Self {
        Self {
            started_at: Utc::now(),
            finished_at: None,
            discovered: 0,
            downloaded: 0,
            reused: 0,
            failed: 0,
            failed_urls: Vec::new(),
        }
    }

    /// Number of references now served locally
    pub fn succeeded(&self) -> u64 {
        self.downloaded + self.reused
    }

    /// Wall-clock duration of the run, once finished
    pub fn duration_seconds(&self) -> Option<i64> {
        self.finished_at
            .map(|finished| (finished - self.started_at).num_seconds())
    }

    /// One-line outcome summary used at the end of the progress log
    pub fn summary_line(&self) -> String {
        if self.failed > 0 {
            format!(
                "Completed with failures: {} succeeded, {} failed",
                self.succeeded(),
                self.failed
            )
        } else {
            format!("Completed: all {} references succeeded", self.succeeded())
        }
    }
}

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `stats` - The statistics to display
pub fn print_statistics(stats: &LocalizationStats) {
    println!("=== Localization Statistics ===\n");

    println!("Overview:");
    println!("  References discovered: {}", stats.discovered);
    println!("  Downloaded: {}", stats.downloaded);
    println!("  Already present: {}", stats.reused);
    println!("  Failed: {}", stats.failed);
    if let Some(seconds) = stats.duration_seconds() {
        println!("  Duration: {}s", seconds);
    }
    println!();

    if !stats.failed_urls.is_empty() {
        println!("Failed References ({}):", stats.failed_urls.len());
        for (i, url) in stats.failed_urls.iter().enumerate() {
            println!("  {}. {}", i + 1, url);
        }
        println!();
    }

    let success_rate = if stats.discovered > 0 {
        (stats.succeeded() as f64 / stats.discovered as f64) * 100.0
    } else {
        100.0
    };

    println!(
        "Success Rate: {:.1}% ({} / {} references localized)",
        success_rate,
        stats.succeeded(),
        stats.discovered
    );
}
