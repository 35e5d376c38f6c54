//! Progress sink interface and the in-memory progress log

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

/// Severity of a progress message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    /// Milestones and discovery batches
    Info,
    /// A resource was localized
    Success,
    /// A resource could not be localized
    Failure,
    /// The run was interrupted or degraded
    Warning,
}

impl Severity {
    /// Returns the lowercase name of the severity
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Success => "success",
            Self::Failure => "failure",
            Self::Warning => "warning",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Receives progress messages from a localization run
///
/// Implementations must be cheap and non-blocking; they are called from the
/// pipeline's coordinator loops.
pub trait ProgressSink: Send + Sync {
    /// Reports one progress message
    fn report(&self, message: &str, severity: Severity);
}

impl<F> ProgressSink for F
where
    F: Fn(&str, Severity) + Send + Sync,
{
    fn report(&self, message: &str, severity: Severity) {
        self(message, severity)
    }
}

/// Discards every message
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl ProgressSink for NullSink {
    fn report(&self, _message: &str, _severity: Severity) {}
}

/// Forwards progress messages to `tracing`
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl ProgressSink for TracingSink {
    fn report(&self, message: &str, severity: Severity) {
        match severity {
            Severity::Info => tracing::info!("{}", message),
            Severity::Success => tracing::debug!("{}", message),
            Severity::Failure => tracing::warn!("{}", message),
            Severity::Warning => tracing::warn!("{}", message),
        }
    }
}

/// Accumulates a textual log of every message while forwarding to a sink
///
/// Each message is appended as `[LEVEL] message`. The log is handed back to
/// the caller whether the run succeeds or fails.
pub struct ProgressLog {
    inner: Arc<dyn ProgressSink>,
    lines: Mutex<String>,
}

impl ProgressLog {
    /// Creates a log forwarding to `inner`
    pub fn new(inner: Arc<dyn ProgressSink>) -> Self {
        Self {
            inner,
            lines: Mutex::new(String::new()),
        }
    }

    /// Creates a log that only records messages
    pub fn detached() -> Self {
        Self::new(Arc::new(NullSink))
    }

    /// Returns a copy of the accumulated log
    pub fn contents(&self) -> String {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl ProgressSink for ProgressLog {
    fn report(&self, message: &str, severity: Severity) {
        {
            let mut lines = self.lines.lock().unwrap_or_else(PoisonError::into_inner);
            lines.push('[');
            lines.push_str(&severity.as_str().to_uppercase());
            lines.push_str("] ");
            lines.push_str(message);
            lines.push('\n');
        }
        self.inner.report(message, severity);
    }
}

impl fmt::Debug for ProgressLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProgressLog")
            .field("bytes", &self.contents().len())
            .finish()
    }
}
