//! Flotilla batch runner
//!
//! Runs every task of a [`TaskDefinition`] in its own container, all at
//! once, and reports when the last one has finished.
//!
//! - [`lifecycle`]: drives one task through pull → create → start → wait →
//!   (optional) remove
//! - [`orchestrator`]: launches one concurrent unit per task and collects
//!   exactly one outcome from each

pub mod config;
pub mod error;
pub mod lifecycle;
pub mod orchestrator;
pub mod output;

#[cfg(test)]
mod fake;

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use flotilla_core::{RunSummary, TaskDefinition};
use flotilla_engine::{ContainerRuntime, DockerRuntime, EngineError};

pub use config::{OutputFormat, RunnerConfig};
pub use error::LifecycleError;
pub use lifecycle::LifecycleDriver;
pub use orchestrator::Orchestrator;

/// Build an orchestrator over `runtime` configured by `config`.
pub fn orchestrator(runtime: Arc<dyn ContainerRuntime>, config: &RunnerConfig) -> Orchestrator {
    Orchestrator::new(LifecycleDriver::new(runtime)).with_max_concurrent(config.max_concurrent_tasks)
}

/// Connect to the configured engine and run `definition` to completion.
pub async fn run(
    definition: &TaskDefinition,
    config: &RunnerConfig,
    cancel: CancellationToken,
) -> Result<RunSummary, EngineError> {
    let runtime = DockerRuntime::connect(config.docker_host.as_deref()).await?;
    let orchestrator = orchestrator(Arc::new(runtime), config);
    Ok(orchestrator.run_all(definition, cancel).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake::FakeRuntime;
    use flotilla_core::Task;

    #[tokio::test]
    async fn test_orchestrator_honours_config() {
        let runtime = Arc::new(FakeRuntime::new());
        let config = RunnerConfig::default().with_max_concurrent_tasks(1);
        let definition = TaskDefinition::new(vec![Task::new("one", "busybox"), Task::new("two", "busybox")]);

        let summary = orchestrator(runtime.clone(), &config)
            .run_all(&definition, CancellationToken::new())
            .await;

        assert!(summary.is_success());
        assert_eq!(runtime.peak_waiting(), 1);
    }
}
