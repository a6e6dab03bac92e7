//! Task and TaskDefinition types.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::CoreError;

/// A task definition document: an ordered list of tasks to run together.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskDefinition {
    /// Document version. Informational only.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub version: String,

    /// Tasks in launch order.
    #[serde(default)]
    pub tasks: Vec<Task>,
}

impl TaskDefinition {
    /// Create a definition from a list of tasks.
    pub fn new(tasks: Vec<Task>) -> Self {
        Self {
            version: String::new(),
            tasks,
        }
    }

    /// Parse and validate a definition from YAML text.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, CoreError> {
        let def: TaskDefinition = serde_yaml::from_str(yaml)?;
        def.validate()?;
        Ok(def)
    }

    /// Read, parse and validate a definition file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, CoreError> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path).map_err(|source| CoreError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&yaml)
    }

    /// Check that every task can be turned into a uniquely named container.
    pub fn validate(&self) -> Result<(), CoreError> {
        let mut seen = HashSet::with_capacity(self.tasks.len());

        for (index, task) in self.tasks.iter().enumerate() {
            if task.name.is_empty() {
                return Err(CoreError::EmptyTaskName { index });
            }
            if !is_valid_container_name(&task.name) {
                return Err(CoreError::InvalidTaskName(task.name.clone()));
            }
            if task.image.trim().is_empty() {
                return Err(CoreError::MissingRunner(task.name.clone()));
            }
            if !seen.insert(task.name.as_str()) {
                return Err(CoreError::DuplicateTaskName(task.name.clone()));
            }
        }

        Ok(())
    }

    /// Number of tasks in the definition.
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// True if the definition contains no tasks.
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

/// A single task: one container run from a runner image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Task name, also used as the container name.
    pub name: String,

    /// Runner image reference.
    #[serde(rename = "runner")]
    pub image: String,

    /// Command to run. Empty means the image's default command.
    #[serde(default)]
    pub command: Vec<String>,

    /// Remove the container after a successful run.
    #[serde(default)]
    pub cleanup: bool,
}

impl Task {
    /// Create a new Task with no command and cleanup disabled.
    pub fn new(name: impl Into<String>, image: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            image: image.into(),
            command: Vec::new(),
            cleanup: false,
        }
    }

    /// Builder method to set the command.
    pub fn with_command<I, S>(mut self, command: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.command = command.into_iter().map(Into::into).collect();
        self
    }

    /// Builder method to set the cleanup flag.
    pub fn with_cleanup(mut self, cleanup: bool) -> Self {
        self.cleanup = cleanup;
        self
    }
}

/// Docker container names match `[a-zA-Z0-9][a-zA-Z0-9_.-]+`, so at least
/// two characters.
fn is_valid_container_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphanumeric() => {}
        _ => return false,
    }
    let rest = chars.as_str();
    !rest.is_empty()
        && rest
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
}
