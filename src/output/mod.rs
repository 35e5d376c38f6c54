//! Output module for progress reporting and run statistics
//!
//! This module handles:
//! - The progress sink interface consumed by the localization pipeline
//! - Accumulating the textual progress log returned to callers
//! - Recording and displaying per-run statistics

mod progress;
pub mod stats;

pub use progress::{NullSink, ProgressLog, ProgressSink, Severity, TracingSink};
pub use stats::{print_statistics, LocalizationStats};
