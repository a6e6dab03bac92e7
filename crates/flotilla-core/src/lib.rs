//! Flotilla Core Domain Types
//!
//! This crate contains pure domain types with no dependencies on:
//! - The container engine or its API client
//! - Async runtimes
//!
//! It also owns loading task definition documents from YAML.

pub mod error;
pub mod ids;
pub mod outcome;
pub mod status;
pub mod task;

// Re-export commonly used types
pub use error::CoreError;
pub use ids::{ContainerId, RunId};
pub use outcome::{RunSummary, TaskOutcome, TaskResult};
pub use status::{FailureKind, TaskStage};
pub use task::{Task, TaskDefinition};
