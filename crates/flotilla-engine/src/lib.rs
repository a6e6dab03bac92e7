//! Container engine boundary for Flotilla
//!
//! This crate defines the capability set the orchestrator needs from a
//! container engine ([`ContainerRuntime`]) and provides a Docker Engine API
//! implementation of it ([`DockerRuntime`]).
//!
//! # Example
//!
//! ```rust,no_run
//! use flotilla_engine::{ContainerRuntime, ContainerSpec, DockerRuntime};
//!
//! async fn run() -> Result<(), Box<dyn std::error::Error>> {
//!     let runtime = DockerRuntime::connect(None).await?;
//!
//!     let id = runtime
//!         .create_container(&ContainerSpec {
//!             name: "hello".to_string(),
//!             image: "busybox".to_string(),
//!             command: vec!["echo".to_string(), "hi".to_string()],
//!         })
//!         .await?;
//!     runtime.start_container(&id).await?;
//!
//!     let code = runtime.wait_container(&id).await?;
//!     println!("exit code: {}", code);
//!     Ok(())
//! }
//! ```

mod docker;
mod error;
mod runtime;
mod types;

pub use docker::DockerRuntime;
pub use error::EngineError;
pub use runtime::{ContainerRuntime, PullStream};
pub use types::{pull_target, ContainerInfo, ContainerSpec, ProgressDetail, PullStatus};
