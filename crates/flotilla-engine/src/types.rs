//! Request and response types at the container engine boundary.

use serde::{Deserialize, Serialize};

use flotilla_core::Task;

/// One record of the streamed image pull progress.
///
/// Mirrors the JSON lines the engine emits while pulling:
/// `{"status":"Downloading","progressDetail":{"current":1,"total":2},"id":"..."}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct PullStatus {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,

    /// Set when the engine failed the pull. Fatal even if later records
    /// report progress.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<String>,

    #[serde(
        default,
        rename = "progressDetail",
        skip_serializing_if = "Option::is_none"
    )]
    pub progress_detail: Option<ProgressDetail>,
}

impl PullStatus {
    /// Create a plain status record.
    pub fn with_status(status: impl Into<String>) -> Self {
        Self {
            status: Some(status.into()),
            ..Default::default()
        }
    }

    /// Create a record carrying an error.
    pub fn with_error(error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Default::default()
        }
    }

    /// The error message, if the record carries a non-empty one.
    pub fn error_message(&self) -> Option<&str> {
        self.error.as_deref().filter(|e| !e.is_empty())
    }
}

/// Byte counters attached to a pull record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct ProgressDetail {
    #[serde(default)]
    pub current: i64,
    #[serde(default)]
    pub total: i64,
}

/// What to create: a named container from an image and command.
///
/// Host configuration is always the engine default (no limits, mounts or
/// networks).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerSpec {
    pub name: String,
    pub image: String,
    pub command: Vec<String>,
}

impl From<&Task> for ContainerSpec {
    fn from(task: &Task) -> Self {
        Self {
            name: task.name.clone(),
            image: task.image.clone(),
            command: task.command.clone(),
        }
    }
}

/// Result of inspecting an existing container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerInfo {
    pub running: bool,
}

/// Split an image reference into the `(from_image, tag)` pair the pull API
/// expects. Untagged references pull `latest`; digest references are passed
/// through whole with an empty tag.
pub fn pull_target(image: &str) -> (String, String) {
    if image.contains('@') {
        return (image.to_string(), String::new());
    }

    let name_start = image.rfind('/').map(|i| i + 1).unwrap_or(0);
    match image[name_start..].rfind(':') {
        Some(offset) => {
            let split = name_start + offset;
            (image[..split].to_string(), image[split + 1..].to_string())
        }
        None => (image.to_string(), "latest".to_string()),
    }
}
