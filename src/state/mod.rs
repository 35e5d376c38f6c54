//! State module for tracking localization progress
//!
//! This module provides the run state machine and the state shared between the
//! coordinator loops and the download workers.
//!
//! # Components
//!
//! - `PipelineState`: Lifecycle of a localization run (idle, running, draining, finished)
//! - `ProcessedSet`: Atomic check-and-set of URLs already scheduled in this run
//! - `ReferenceMap`: Successfully localized URLs and their public paths
//! - `PendingCounter`: Outstanding scan and download units, with a wake-up at zero

mod pipeline_state;
mod shared;

// Re-export main types
pub use pipeline_state::PipelineState;
pub use shared::{PendingCounter, ProcessedSet, ReferenceMap};
