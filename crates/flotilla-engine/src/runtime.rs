//! The container runtime capability set.
//!
//! The lifecycle driver only talks to the engine through this trait, so it
//! can be exercised against a substitute implementation without a real
//! engine present.

use async_trait::async_trait;
use futures_util::stream::BoxStream;

use flotilla_core::ContainerId;

use crate::error::EngineError;
use crate::types::{ContainerInfo, ContainerSpec, PullStatus};

/// Streamed image pull progress. Dropping the stream releases the
/// underlying response.
pub type PullStream = BoxStream<'static, Result<PullStatus, EngineError>>;

/// Operations the orchestrator needs from a container engine.
///
/// Implementations are shared by every concurrently running task and must
/// be safe for concurrent use.
#[async_trait]
pub trait ContainerRuntime: Send + Sync {
    /// Start pulling `image`, returning the stream of progress records.
    async fn pull_image(&self, image: &str) -> Result<PullStream, EngineError>;

    /// Create (but do not start) a container. Fails with
    /// [`EngineError::NameConflict`] if the name is taken.
    async fn create_container(&self, spec: &ContainerSpec) -> Result<ContainerId, EngineError>;

    /// Start a created container.
    async fn start_container(&self, id: &ContainerId) -> Result<(), EngineError>;

    /// Inspect a container. [`EngineError::NotFound`] means it no longer exists.
    async fn inspect_container(&self, id: &ContainerId) -> Result<ContainerInfo, EngineError>;

    /// Resolve once the container is no longer running, yielding its exit
    /// code. Non-zero codes are returned as `Ok`, not as errors.
    async fn wait_container(&self, id: &ContainerId) -> Result<i64, EngineError>;

    /// Remove a stopped container.
    async fn remove_container(&self, id: &ContainerId) -> Result<(), EngineError>;
}
