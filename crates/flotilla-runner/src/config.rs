//! Runner configuration.

use std::time::Duration;

/// How the final run summary is printed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// One line per task plus a tally.
    #[default]
    Text,
    /// The run summary as a single JSON document on stdout.
    Json,
}

/// Runner configuration.
#[derive(Debug, Clone, Default)]
pub struct RunnerConfig {
    /// Container engine endpoint. `None` uses `DOCKER_HOST` or the local socket.
    pub docker_host: Option<String>,

    /// Maximum task lifecycles running at once. `None` means every task
    /// launches immediately.
    pub max_concurrent_tasks: Option<usize>,

    /// Deadline for the whole run, after which in-flight steps are cancelled.
    pub timeout: Option<Duration>,

    /// Summary output format.
    pub output: OutputFormat,
}

impl RunnerConfig {
    /// Builder method to set the engine endpoint.
    pub fn with_docker_host(mut self, host: impl Into<String>) -> Self {
        self.docker_host = Some(host.into());
        self
    }

    /// Builder method to cap concurrent task lifecycles. Zero means unbounded.
    pub fn with_max_concurrent_tasks(mut self, max: usize) -> Self {
        self.max_concurrent_tasks = (max > 0).then_some(max);
        self
    }

    /// Builder method to set the run deadline in seconds. Zero means none.
    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout = (secs > 0).then(|| Duration::from_secs(secs));
        self
    }

    /// Builder method to set the output format.
    pub fn with_output(mut self, output: OutputFormat) -> Self {
        self.output = output;
        self
    }
}
