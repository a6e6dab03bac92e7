//! Lifecycle step failures.

use flotilla_core::FailureKind;
use flotilla_engine::EngineError;
use thiserror::Error;

/// A failure that aborts a task's lifecycle.
#[derive(Debug, Error)]
pub enum LifecycleError {
    /// Pull request or stream transport/decode failure.
    #[error("image pull failed for '{image}': {source}")]
    Pull {
        image: String,
        #[source]
        source: EngineError,
    },

    /// The pull stream carried an error record.
    #[error("image pull failed for '{image}': {message}")]
    PullReported { image: String, message: String },

    /// The engine rejected container creation.
    #[error("container create failed: {0}")]
    Create(#[source] EngineError),

    /// The engine rejected container start.
    #[error("container start failed: {0}")]
    Start(#[source] EngineError),

    /// The wait channel reported an error.
    #[error("waiting for container failed: {0}")]
    Wait(#[source] EngineError),

    /// The shared cancellation token fired during a step.
    #[error("cancelled during {step}")]
    Cancelled { step: &'static str },
}

impl LifecycleError {
    /// Classify the failure for the task outcome.
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Pull { .. } | Self::PullReported { .. } => FailureKind::Pull,
            Self::Create(_) => FailureKind::Create,
            Self::Start(_) => FailureKind::Start,
            Self::Wait(_) => FailureKind::Wait,
            Self::Cancelled { .. } => FailureKind::Cancelled,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_mapping() {
        let err = LifecycleError::PullReported {
            image: "busybox".into(),
            message: "denied".into(),
        };
        assert_eq!(err.kind(), FailureKind::Pull);
        assert_eq!(err.to_string(), "image pull failed for 'busybox': denied");

        let err = LifecycleError::Create(EngineError::NameConflict {
            name: "a1".into(),
            message: "Conflict".into(),
        });
        assert_eq!(err.kind(), FailureKind::Create);

        let err = LifecycleError::Cancelled { step: "wait" };
        assert_eq!(err.kind(), FailureKind::Cancelled);
        assert_eq!(err.to_string(), "cancelled during wait");
    }
}
