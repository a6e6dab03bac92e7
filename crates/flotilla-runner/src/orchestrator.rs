//! Task orchestrator - fans tasks out, fans completion signals in.

use std::sync::Arc;

use tokio::sync::{mpsc, Semaphore};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use flotilla_core::{FailureKind, RunId, RunSummary, TaskDefinition, TaskOutcome};

use crate::lifecycle::LifecycleDriver;

/// Runs every task of a definition concurrently and reports when all of
/// them have reached a terminal state.
pub struct Orchestrator {
    driver: LifecycleDriver,
    limit: Option<Arc<Semaphore>>,
}

impl Orchestrator {
    /// Create an orchestrator with unbounded fan-out.
    pub fn new(driver: LifecycleDriver) -> Self {
        Self {
            driver,
            limit: None,
        }
    }

    /// Builder method to cap how many task lifecycles run at once.
    /// `None` (or zero) means unbounded.
    pub fn with_max_concurrent(mut self, max: Option<usize>) -> Self {
        self.limit = max.filter(|n| *n > 0).map(|n| Arc::new(Semaphore::new(n)));
        self
    }

    /// Run all tasks and resolve once every one of them has reported.
    ///
    /// One task's failure never affects another. `cancel` is shared by all
    /// tasks; cancelling it makes in-flight steps fail with a cancellation
    /// outcome, but every task still reports.
    pub async fn run_all(&self, definition: &TaskDefinition, cancel: CancellationToken) -> RunSummary {
        let run_id = RunId::generate();
        let total = definition.len();
        let mut summary = RunSummary::new(run_id.clone(), total);

        info!(run_id = %run_id, tasks = total, "Starting run");

        let (done_tx, mut done_rx) = mpsc::unbounded_channel::<TaskOutcome>();

        for task in definition.tasks.iter().cloned() {
            let guard = CompletionGuard::new(done_tx.clone(), task.name.clone());
            let driver = self.driver.clone();
            let limit = self.limit.clone();
            let cancel = cancel.clone();

            tokio::spawn(async move {
                let _permit = match limit {
                    Some(semaphore) => match semaphore.acquire_owned().await {
                        Ok(permit) => Some(permit),
                        // Semaphore closed: the guard reports the task as aborted.
                        Err(_) => return,
                    },
                    None => None,
                };

                let outcome = driver.run_task(&task, &cancel).await;
                guard.complete(outcome);
            });
        }

        // Only the guards hold senders now, so the channel closes once every
        // unit has reported.
        drop(done_tx);

        while summary.reported() < total {
            match done_rx.recv().await {
                Some(outcome) => {
                    info!(
                        run_id = %run_id,
                        task = %outcome.task_name,
                        success = outcome.success(),
                        reported = summary.reported() + 1,
                        total,
                        "Task reported"
                    );
                    summary.record(outcome);
                }
                None => {
                    error!(
                        run_id = %run_id,
                        reported = summary.reported(),
                        total,
                        "Completion channel closed before every task reported"
                    );
                    break;
                }
            }
        }

        info!(
            run_id = %run_id,
            succeeded = summary.succeeded,
            failed = summary.failed,
            "Run complete"
        );
        summary
    }
}

/// Sends a task's completion signal exactly once, on every exit path.
///
/// If the unit ends without calling [`complete`](Self::complete) (early
/// return or panic), the drop sends an aborted outcome instead.
struct CompletionGuard {
    tx: mpsc::UnboundedSender<TaskOutcome>,
    task_name: String,
    outcome: Option<TaskOutcome>,
}

impl CompletionGuard {
    fn new(tx: mpsc::UnboundedSender<TaskOutcome>, task_name: String) -> Self {
        Self {
            tx,
            task_name,
            outcome: None,
        }
    }

    fn complete(mut self, outcome: TaskOutcome) {
        self.outcome = Some(outcome);
    }
}

impl Drop for CompletionGuard {
    fn drop(&mut self) {
        let outcome = self.outcome.take().unwrap_or_else(|| {
            warn!(task = %self.task_name, "Task ended without an outcome");
            TaskOutcome::failed(
                &self.task_name,
                FailureKind::Aborted,
                "task execution ended unexpectedly",
            )
        });

        if self.tx.send(outcome).is_err() {
            warn!(task = %self.task_name, "Completion receiver dropped");
        }
    }
}
