//! Lifecycle stages and failure classification.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Where a task is in its container lifecycle.
///
/// `Pending -> Pulling -> Created -> Started -> Waiting -> {Succeeded | Failed} -> [Removed]`.
/// There is no retry transition.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStage {
    /// Task accepted, nothing requested from the engine yet.
    #[default]
    Pending,
    /// Runner image is being pulled.
    Pulling,
    /// Container exists but has not been started.
    Created,
    /// Container has been started.
    Started,
    /// Waiting for the container to stop running.
    Waiting,
    /// Container exited with code 0 (or was already gone).
    Succeeded,
    /// A lifecycle step failed or the container exited non-zero.
    Failed,
    /// Container removed after success.
    Removed,
}

impl fmt::Display for TaskStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::Pulling => "pulling",
            Self::Created => "created",
            Self::Started => "started",
            Self::Waiting => "waiting",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
            Self::Removed => "removed",
        };
        f.write_str(s)
    }
}

/// Which lifecycle step a task failed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Image pull transport/decode failure, or an error record in the stream.
    Pull,
    /// The engine rejected container creation.
    Create,
    /// The engine rejected container start.
    Start,
    /// The wait channel reported an error.
    Wait,
    /// The shared cancellation token fired (Ctrl-C or run deadline).
    Cancelled,
    /// The execution unit ended without producing an outcome (panic).
    Aborted,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Pull => "pull",
            Self::Create => "create",
            Self::Start => "start",
            Self::Wait => "wait",
            Self::Cancelled => "cancelled",
            Self::Aborted => "aborted",
        };
        f.write_str(s)
    }
}
