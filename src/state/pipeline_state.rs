/// Pipeline state definitions for tracking a localization run
///
/// This module defines every state a run moves through, from creation until
/// the coordinator has joined its tasks.
use std::fmt;

/// Represents the current state of a localization run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PipelineState {
    // ===== Active States =====
    /// Coordinator created but `run` not yet called
    #[default]
    Idle,

    /// Scan and download tasks are being processed
    Running,

    /// Work has quiesced or stop was raised; loops and workers are shutting down
    Draining,

    // ===== Terminal States =====
    /// Every scheduled unit finished without a stop request
    Completed,

    /// The caller raised the stop signal before the run quiesced
    Stopped,

    /// A coordinator task failed unexpectedly
    Failed,
}

impl PipelineState {
    /// Returns true if this is a terminal state (the run is over)
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Stopped | Self::Failed)
    }

    /// Returns true if this state still has tasks alive
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Running | Self::Draining)
    }

    /// Returns true if the state machine allows moving from `self` to `next`
    ///
    /// `Failed` may be entered from any active state; the other terminal
    /// states are only reachable through `Draining`.
    pub fn can_transition_to(&self, next: PipelineState) -> bool {
        matches!(
            (self, next),
            (Self::Idle, Self::Running)
                | (Self::Running, Self::Draining)
                | (Self::Running, Self::Failed)
                | (Self::Draining, Self::Completed)
                | (Self::Draining, Self::Stopped)
                | (Self::Draining, Self::Failed)
        )
    }

    /// Returns the lowercase name of the state
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Draining => "draining",
            Self::Completed => "completed",
            Self::Stopped => "stopped",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
