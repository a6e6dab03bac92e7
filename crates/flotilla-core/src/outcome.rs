//! Task outcomes and the run summary built from them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{FailureKind, RunId};

/// How a task's lifecycle ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum TaskResult {
    /// Container exited with code 0, or was already gone when waited on.
    Succeeded,
    /// Container ran to completion with a non-zero exit code.
    ExitNonZero { code: i64 },
    /// A lifecycle step failed before the container finished.
    Failed { kind: FailureKind, message: String },
}

impl TaskResult {
    /// Returns true only for `Succeeded`.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded)
    }
}

/// Terminal report for one task, produced exactly once per task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskOutcome {
    /// Name of the task this outcome belongs to.
    pub task_name: String,

    /// How the lifecycle ended.
    #[serde(flatten)]
    pub result: TaskResult,

    /// Whether the container was removed by cleanup.
    pub removed: bool,

    /// When the lifecycle started.
    pub started_at: DateTime<Utc>,

    /// When the lifecycle reached a terminal state.
    pub finished_at: DateTime<Utc>,
}

impl TaskOutcome {
    /// Create an outcome stamped with the current time.
    pub fn new(task_name: impl Into<String>, result: TaskResult) -> Self {
        let now = Utc::now();
        Self {
            task_name: task_name.into(),
            result,
            removed: false,
            started_at: now,
            finished_at: now,
        }
    }

    /// Shorthand for a failed outcome.
    pub fn failed(task_name: impl Into<String>, kind: FailureKind, message: impl Into<String>) -> Self {
        Self::new(
            task_name,
            TaskResult::Failed {
                kind,
                message: message.into(),
            },
        )
    }

    /// Builder method to set the lifecycle start time.
    pub fn with_started_at(mut self, started_at: DateTime<Utc>) -> Self {
        self.started_at = started_at;
        self
    }

    /// Builder method to record cleanup removal.
    pub fn with_removed(mut self, removed: bool) -> Self {
        self.removed = removed;
        self
    }

    /// The boolean view: true only when the task succeeded.
    pub fn success(&self) -> bool {
        self.result.is_success()
    }

    /// Lifecycle duration in milliseconds.
    pub fn duration_ms(&self) -> i64 {
        (self.finished_at - self.started_at).num_milliseconds()
    }
}

/// Completion report for a whole run, emitted once every task has reported.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Identifier for this run.
    pub run_id: RunId,

    /// Number of tasks in the definition.
    pub total: usize,

    /// Tasks that succeeded.
    pub succeeded: usize,

    /// Tasks that failed for any reason, including non-zero exits.
    pub failed: usize,

    /// Outcomes in the order they were received.
    pub outcomes: Vec<TaskOutcome>,
}

impl RunSummary {
    /// Create an empty summary expecting `total` outcomes.
    pub fn new(run_id: RunId, total: usize) -> Self {
        Self {
            run_id,
            total,
            succeeded: 0,
            failed: 0,
            outcomes: Vec::with_capacity(total),
        }
    }

    /// Record one task outcome.
    pub fn record(&mut self, outcome: TaskOutcome) {
        if outcome.success() {
            self.succeeded += 1;
        } else {
            self.failed += 1;
        }
        self.outcomes.push(outcome);
    }

    /// Number of outcomes recorded so far.
    pub fn reported(&self) -> usize {
        self.outcomes.len()
    }

    /// True once every expected outcome has been recorded.
    pub fn is_complete(&self) -> bool {
        self.reported() >= self.total
    }

    /// True if the run is complete and no task failed.
    pub fn is_success(&self) -> bool {
        self.is_complete() && self.failed == 0
    }

    /// Look up the outcome for a task by name.
    pub fn outcome(&self, task_name: &str) -> Option<&TaskOutcome> {
        self.outcomes.iter().find(|o| o.task_name == task_name)
    }
}
