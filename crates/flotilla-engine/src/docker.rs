//! Docker Engine API implementation of [`ContainerRuntime`].
//!
//! Talks to the daemon over its HTTP API through `bollard`. A single client
//! is cloned into every call, so one `DockerRuntime` can be shared by all
//! concurrently running tasks.

use async_trait::async_trait;
use bollard::container::{
    Config, CreateContainerOptions, InspectContainerOptions, RemoveContainerOptions,
    StartContainerOptions, WaitContainerOptions,
};
use bollard::errors::Error as ApiError;
use bollard::image::CreateImageOptions;
use bollard::models::{CreateImageInfo, HostConfig};
use bollard::{Docker, API_DEFAULT_VERSION};
use futures_util::StreamExt;
use tracing::{debug, info};

use flotilla_core::ContainerId;

use crate::error::EngineError;
use crate::runtime::{ContainerRuntime, PullStream};
use crate::types::{pull_target, ContainerInfo, ContainerSpec, ProgressDetail, PullStatus};

/// Request timeout for engine API calls, in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Wait condition: resolve when the container leaves the running state.
const WAIT_CONDITION_NOT_RUNNING: &str = "not-running";

/// Container runtime backed by a Docker-compatible engine.
#[derive(Debug, Clone)]
pub struct DockerRuntime {
    docker: Docker,
}

impl DockerRuntime {
    /// Connect to the engine and negotiate the API version.
    ///
    /// With no `host`, the usual defaults apply (`DOCKER_HOST`, then the
    /// local socket). `unix://` hosts use the socket transport, anything
    /// else is treated as an HTTP address.
    pub async fn connect(host: Option<&str>) -> Result<Self, EngineError> {
        let label = host.unwrap_or("default").to_string();
        let connect_err = |source| EngineError::Connect {
            host: label.clone(),
            source,
        };

        let docker = match host {
            None => Docker::connect_with_defaults(),
            #[cfg(unix)]
            Some(h) if h.starts_with("unix://") => {
                Docker::connect_with_unix(h, DEFAULT_TIMEOUT_SECS, API_DEFAULT_VERSION)
            }
            Some(h) => Docker::connect_with_http(h, DEFAULT_TIMEOUT_SECS, API_DEFAULT_VERSION),
        }
        .map_err(connect_err)?;

        let docker = docker.negotiate_version().await.map_err(connect_err)?;
        info!(host = %label, "Connected to container engine");

        Ok(Self { docker })
    }
}

#[async_trait]
impl ContainerRuntime for DockerRuntime {
    async fn pull_image(&self, image: &str) -> Result<PullStream, EngineError> {
        let (from_image, tag) = pull_target(image);
        debug!(image = %image, from_image = %from_image, tag = %tag, "Requesting image pull");

        let options = CreateImageOptions {
            from_image,
            tag,
            ..Default::default()
        };

        let stream = self
            .docker
            .create_image(Some(options), None, None)
            .map(|item| item.map(pull_status_from).map_err(EngineError::from));

        Ok(stream.boxed())
    }

    async fn create_container(&self, spec: &ContainerSpec) -> Result<ContainerId, EngineError> {
        let options = CreateContainerOptions {
            name: spec.name.clone(),
            platform: None,
        };

        let config = Config {
            image: Some(spec.image.clone()),
            cmd: (!spec.command.is_empty()).then(|| spec.command.clone()),
            host_config: Some(HostConfig::default()),
            ..Default::default()
        };

        let response = self
            .docker
            .create_container(Some(options), config)
            .await
            .map_err(|e| EngineError::classify_create(e, &spec.name))?;

        for warning in &response.warnings {
            debug!(container = %spec.name, warning = %warning, "Engine warning on create");
        }

        Ok(ContainerId::new(response.id))
    }

    async fn start_container(&self, id: &ContainerId) -> Result<(), EngineError> {
        self.docker
            .start_container(id.as_str(), None::<StartContainerOptions<String>>)
            .await
            .map_err(|e| EngineError::classify(e, id.as_str()))
    }

    async fn inspect_container(&self, id: &ContainerId) -> Result<ContainerInfo, EngineError> {
        let response = self
            .docker
            .inspect_container(id.as_str(), None::<InspectContainerOptions>)
            .await
            .map_err(|e| EngineError::classify(e, id.as_str()))?;

        let running = response
            .state
            .and_then(|state| state.running)
            .unwrap_or(false);

        Ok(ContainerInfo { running })
    }

    async fn wait_container(&self, id: &ContainerId) -> Result<i64, EngineError> {
        let options = WaitContainerOptions {
            condition: WAIT_CONDITION_NOT_RUNNING,
        };
        let mut stream = self.docker.wait_container(id.as_str(), Some(options));

        match stream.next().await {
            Some(Ok(response)) => Ok(response.status_code),
            // bollard reports non-zero exits as errors; they are statuses here.
            Some(Err(ApiError::DockerContainerWaitError { error, code })) => {
                if !error.is_empty() {
                    debug!(container = %id.short(), code, error = %error, "Wait reported exit error");
                }
                Ok(code)
            }
            Some(Err(e)) => Err(EngineError::classify(e, id.as_str())),
            None => Err(EngineError::WaitInterrupted(id.to_string())),
        }
    }

    async fn remove_container(&self, id: &ContainerId) -> Result<(), EngineError> {
        self.docker
            .remove_container(id.as_str(), None::<RemoveContainerOptions>)
            .await
            .map_err(|e| EngineError::classify(e, id.as_str()))
    }
}

fn pull_status_from(info: CreateImageInfo) -> PullStatus {
    PullStatus {
        id: info.id,
        status: info.status,
        error: info.error,
        progress: info.progress,
        progress_detail: info.progress_detail.map(|detail| ProgressDetail {
            current: detail.current.unwrap_or_default(),
            total: detail.total.unwrap_or_default(),
        }),
    }
}
