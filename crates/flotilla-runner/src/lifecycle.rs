//! Container lifecycle driver.
//!
//! Drives one task through pull → create → start → wait → (optional) remove
//! and turns the engine's responses into a [`TaskOutcome`]. Every step races
//! the shared cancellation token; removal is best-effort and never flips a
//! successful outcome.

use std::future::Future;
use std::sync::Arc;

use chrono::Utc;
use tokio_stream::StreamExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use flotilla_core::{ContainerId, Task, TaskOutcome, TaskResult, TaskStage};
use flotilla_engine::{ContainerRuntime, ContainerSpec};

use crate::error::LifecycleError;

/// How the wait step resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WaitStatus {
    /// The container stopped with this exit code.
    Exited(i64),
    /// The container could no longer be inspected.
    Gone,
}

/// Runs a single task's container lifecycle against a runtime.
#[derive(Clone)]
pub struct LifecycleDriver {
    runtime: Arc<dyn ContainerRuntime>,
}

impl LifecycleDriver {
    /// Create a driver over a shared runtime client.
    pub fn new(runtime: Arc<dyn ContainerRuntime>) -> Self {
        Self { runtime }
    }

    /// Run the full lifecycle for `task`.
    ///
    /// Never fails: step errors are logged and folded into the outcome.
    pub async fn run_task(&self, task: &Task, cancel: &CancellationToken) -> TaskOutcome {
        let started_at = Utc::now();
        info!(task = %task.name, image = %task.image, "Preparing task");

        let outcome = match self.execute(task, cancel).await {
            Ok((result, removed)) => TaskOutcome::new(&task.name, result).with_removed(removed),
            Err(e) => {
                warn!(
                    task = %task.name,
                    stage = %TaskStage::Failed,
                    kind = %e.kind(),
                    error = %e,
                    "Task failed"
                );
                TaskOutcome::failed(&task.name, e.kind(), e.to_string())
            }
        };

        outcome.with_started_at(started_at)
    }

    async fn execute(
        &self,
        task: &Task,
        cancel: &CancellationToken,
    ) -> Result<(TaskResult, bool), LifecycleError> {
        debug!(task = %task.name, stage = %TaskStage::Pulling, "Pulling runner image");
        self.pull_image(&task.image, cancel).await?;

        let spec = ContainerSpec::from(task);
        let id = cancellable(cancel, "create", self.runtime.create_container(&spec))
            .await?
            .map_err(LifecycleError::Create)?;
        debug!(task = %task.name, stage = %TaskStage::Created, container = %id.short(), "Container created");

        info!(task = %task.name, container = %id.short(), "Starting task");
        cancellable(cancel, "start", self.runtime.start_container(&id))
            .await?
            .map_err(LifecycleError::Start)?;
        debug!(task = %task.name, stage = %TaskStage::Started, "Container started");

        let result = match self.wait_for_exit(task, &id, cancel).await? {
            WaitStatus::Exited(0) | WaitStatus::Gone => TaskResult::Succeeded,
            WaitStatus::Exited(code) => TaskResult::ExitNonZero { code },
        };

        let mut removed = false;
        match &result {
            TaskResult::Succeeded => {
                info!(task = %task.name, stage = %TaskStage::Succeeded, "Completed task");
                if task.cleanup {
                    removed = self.remove(task, &id).await;
                }
            }
            TaskResult::ExitNonZero { code } => {
                warn!(task = %task.name, stage = %TaskStage::Failed, exit_code = code, "Task exited with non-zero code");
            }
            TaskResult::Failed { .. } => {}
        }

        Ok((result, removed))
    }

    /// Pull the image, consuming the progress stream to its end.
    ///
    /// An error record anywhere in the stream fails the pull. The stream is
    /// dropped on every return path.
    async fn pull_image(&self, image: &str, cancel: &CancellationToken) -> Result<(), LifecycleError> {
        let pull_failed = |source| LifecycleError::Pull {
            image: image.to_string(),
            source,
        };

        let mut stream = cancellable(cancel, "pull", self.runtime.pull_image(image))
            .await?
            .map_err(pull_failed)?;

        let mut records = 0u64;
        while let Some(item) = cancellable(cancel, "pull", stream.next()).await? {
            let status = item.map_err(pull_failed)?;
            records += 1;

            if let Some(message) = status.error_message() {
                return Err(LifecycleError::PullReported {
                    image: image.to_string(),
                    message: message.to_string(),
                });
            }

            debug!(
                image = %image,
                layer = ?status.id,
                status = ?status.status,
                progress = ?status.progress,
                "Pull progress"
            );
        }

        debug!(image = %image, records, "Image pull finished");
        Ok(())
    }

    /// Wait for the container to stop running.
    ///
    /// A container that can no longer be inspected is treated as already
    /// finished; very short-lived containers can race the inspection.
    async fn wait_for_exit(
        &self,
        task: &Task,
        id: &ContainerId,
        cancel: &CancellationToken,
    ) -> Result<WaitStatus, LifecycleError> {
        match cancellable(cancel, "inspect", self.runtime.inspect_container(id)).await? {
            Ok(info) => {
                debug!(task = %task.name, stage = %TaskStage::Waiting, running = info.running, "Waiting for container");
            }
            Err(e) if e.is_not_found() => {
                info!(task = %task.name, error = %e, "Container already gone, treating wait as complete");
                return Ok(WaitStatus::Gone);
            }
            Err(e) => {
                warn!(task = %task.name, error = %e, "Inspect failed, treating wait as complete");
                return Ok(WaitStatus::Gone);
            }
        }

        let code = cancellable(cancel, "wait", self.runtime.wait_container(id))
            .await?
            .map_err(LifecycleError::Wait)?;

        Ok(WaitStatus::Exited(code))
    }

    /// Best-effort removal. Returns whether the container was removed.
    async fn remove(&self, task: &Task, id: &ContainerId) -> bool {
        info!(task = %task.name, container = %id.short(), "Cleanup task");

        match self.runtime.remove_container(id).await {
            Ok(()) => {
                debug!(task = %task.name, stage = %TaskStage::Removed, "Container removed");
                true
            }
            Err(e) => {
                warn!(task = %task.name, container = %id.short(), error = %e, "Failed to remove container");
                false
            }
        }
    }
}

/// Race `fut` against the cancellation token. A token that is already
/// cancelled wins.
async fn cancellable<F>(
    cancel: &CancellationToken,
    step: &'static str,
    fut: F,
) -> Result<F::Output, LifecycleError>
where
    F: Future,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(LifecycleError::Cancelled { step }),
        output = fut => Ok(output),
    }
}
