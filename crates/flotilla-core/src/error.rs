//! Core domain errors.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading or validating a task definition.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The definition file could not be read.
    #[error("Failed to read task definition '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The definition document is not valid YAML for the expected schema.
    #[error("Failed to parse task definition: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// A task has no name.
    #[error("Task #{index} has an empty name")]
    EmptyTaskName { index: usize },

    /// A task name is used more than once.
    #[error("Duplicate task name: {0}")]
    DuplicateTaskName(String),

    /// A task name cannot be used as a container name.
    #[error("Invalid task name '{0}': must match [a-zA-Z0-9][a-zA-Z0-9_.-]+")]
    InvalidTaskName(String),

    /// A task has no runner image.
    #[error("Task '{0}' has no runner image")]
    MissingRunner(String),
}
