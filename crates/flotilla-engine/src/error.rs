//! Error types for container engine operations.

use bollard::errors::Error as ApiError;
use thiserror::Error;

/// Errors that can occur while talking to the container engine.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Could not establish a client for the engine endpoint.
    #[error("Failed to connect to container engine at '{host}': {source}")]
    Connect {
        host: String,
        #[source]
        source: bollard::errors::Error,
    },

    /// The referenced container (or image) does not exist.
    #[error("{subject} not found: {message}")]
    NotFound { subject: String, message: String },

    /// A container with the requested name already exists.
    #[error("Container name '{name}' already in use: {message}")]
    NameConflict { name: String, message: String },

    /// The wait stream closed without reporting an exit status.
    #[error("Wait ended without an exit status for container {0}")]
    WaitInterrupted(String),

    /// Any other engine API failure.
    #[error("Docker API error: {0}")]
    Api(#[from] bollard::errors::Error),

    /// Engine failure with a plain message (used by substitute runtimes).
    #[error("Engine error: {0}")]
    Other(String),
}

impl EngineError {
    /// Map an API error on an existing container or image. A 404 becomes
    /// [`EngineError::NotFound`] carrying the engine's message; anything else
    /// is passed through.
    pub fn classify(err: bollard::errors::Error, subject: &str) -> Self {
        match err {
            ApiError::DockerResponseServerError {
                status_code: 404,
                message,
            } => Self::NotFound {
                subject: subject.to_string(),
                message,
            },
            other => Self::Api(other),
        }
    }

    /// Map an API error from container creation. Only here does a 409 mean
    /// the requested name is taken.
    pub fn classify_create(err: bollard::errors::Error, name: &str) -> Self {
        match err {
            ApiError::DockerResponseServerError {
                status_code: 409,
                message,
            } => Self::NameConflict {
                name: name.to_string(),
                message,
            },
            other => Self::classify(other, name),
        }
    }

    /// Returns true if the error means the subject does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
