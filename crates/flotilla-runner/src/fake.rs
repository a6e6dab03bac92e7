//! In-memory container runtime used by the driver and orchestrator tests.

use std::collections::{HashMap, HashSet};
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use std::time::Duration;

use async_trait::async_trait;
use futures_util::stream::{self, Stream, StreamExt};

use flotilla_core::ContainerId;
use flotilla_engine::{
    ContainerInfo, ContainerRuntime, ContainerSpec, EngineError, PullStatus, PullStream,
};

/// Runtime operation, recorded with the container (or image) name it targeted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    Pull,
    Create,
    Start,
    Inspect,
    Wait,
    Remove,
}

enum PullScript {
    Records(Vec<PullStatus>),
    RequestFails,
    StreamBreaks,
    StreamStalls,
}

#[derive(Default)]
struct State {
    pulls: HashMap<String, PullScript>,
    exit_codes: HashMap<String, i64>,
    wait_delays: HashMap<String, Duration>,
    fail_start: HashSet<String>,
    fail_wait: HashSet<String>,
    fail_remove: HashSet<String>,
    gone_before_wait: HashSet<String>,
    hang_wait: HashSet<String>,
    panic_on_create: HashSet<String>,
    names: HashSet<String>,
    containers: HashMap<ContainerId, String>,
    calls: Vec<(Op, String)>,
    next_id: u64,
    waiting: usize,
    peak_waiting: usize,
}

/// Scriptable substitute for a container engine.
///
/// Unscripted images pull cleanly and unscripted containers exit 0.
#[derive(Default)]
pub struct FakeRuntime {
    state: Mutex<State>,
    released_streams: Arc<AtomicUsize>,
}

impl FakeRuntime {
    pub fn new() -> Self {
        Self::default()
    }

    fn with(self, f: impl FnOnce(&mut State)) -> Self {
        f(&mut self.state.lock().unwrap());
        self
    }

    pub fn with_pull_records(self, image: &str, records: Vec<PullStatus>) -> Self {
        self.with(|s| {
            s.pulls.insert(image.to_string(), PullScript::Records(records));
        })
    }

    pub fn with_pull_request_failure(self, image: &str) -> Self {
        self.with(|s| {
            s.pulls.insert(image.to_string(), PullScript::RequestFails);
        })
    }

    pub fn with_broken_pull_stream(self, image: &str) -> Self {
        self.with(|s| {
            s.pulls.insert(image.to_string(), PullScript::StreamBreaks);
        })
    }

    /// The pull stream yields one record, then never another.
    pub fn with_stalled_pull_stream(self, image: &str) -> Self {
        self.with(|s| {
            s.pulls.insert(image.to_string(), PullScript::StreamStalls);
        })
    }

    pub fn with_exit_code(self, name: &str, code: i64) -> Self {
        self.with(|s| {
            s.exit_codes.insert(name.to_string(), code);
        })
    }

    pub fn with_wait_delay(self, name: &str, delay: Duration) -> Self {
        self.with(|s| {
            s.wait_delays.insert(name.to_string(), delay);
        })
    }

    pub fn failing_start(self, name: &str) -> Self {
        self.with(|s| {
            s.fail_start.insert(name.to_string());
        })
    }

    pub fn failing_wait(self, name: &str) -> Self {
        self.with(|s| {
            s.fail_wait.insert(name.to_string());
        })
    }

    pub fn failing_remove(self, name: &str) -> Self {
        self.with(|s| {
            s.fail_remove.insert(name.to_string());
        })
    }

    pub fn gone_before_wait(self, name: &str) -> Self {
        self.with(|s| {
            s.gone_before_wait.insert(name.to_string());
        })
    }

    pub fn hanging_wait(self, name: &str) -> Self {
        self.with(|s| {
            s.hang_wait.insert(name.to_string());
        })
    }

    pub fn panicking_create(self, name: &str) -> Self {
        self.with(|s| {
            s.panic_on_create.insert(name.to_string());
        })
    }

    /// Number of calls of `op` made for `name`.
    pub fn count(&self, op: Op, name: &str) -> usize {
        self.state
            .lock()
            .unwrap()
            .calls
            .iter()
            .filter(|(o, n)| *o == op && n == name)
            .count()
    }

    /// Ops made for `name`, in call order.
    pub fn ops_for(&self, name: &str) -> Vec<Op> {
        self.state
            .lock()
            .unwrap()
            .calls
            .iter()
            .filter(|(_, n)| n == name)
            .map(|(o, _)| *o)
            .collect()
    }

    /// True while a container with this name exists.
    pub fn has_container(&self, name: &str) -> bool {
        self.state.lock().unwrap().names.contains(name)
    }

    /// Pull streams dropped so far.
    pub fn released_streams(&self) -> usize {
        self.released_streams.load(Ordering::SeqCst)
    }

    /// Highest number of containers waited on at the same time.
    pub fn peak_waiting(&self) -> usize {
        self.state.lock().unwrap().peak_waiting
    }

    fn record(&self, op: Op, name: &str) {
        self.state.lock().unwrap().calls.push((op, name.to_string()));
    }

    fn name_of(&self, id: &ContainerId) -> Result<String, EngineError> {
        self.state
            .lock()
            .unwrap()
            .containers
            .get(id)
            .cloned()
            .ok_or_else(|| EngineError::NotFound {
                subject: id.to_string(),
                message: format!("No such container: {}", id),
            })
    }
}

#[async_trait]
impl ContainerRuntime for FakeRuntime {
    async fn pull_image(&self, image: &str) -> Result<PullStream, EngineError> {
        self.record(Op::Pull, image);

        let (items, stalls) = {
            let state = self.state.lock().unwrap();
            let items: Vec<Result<PullStatus, EngineError>> = match state.pulls.get(image) {
                Some(PullScript::RequestFails) => {
                    return Err(EngineError::Other(format!("pull access denied for {}", image)))
                }
                Some(PullScript::StreamStalls) => {
                    vec![Ok(PullStatus::with_status("Pulling fs layer"))]
                }
                Some(PullScript::StreamBreaks) => vec![
                    Ok(PullStatus::with_status("Pulling fs layer")),
                    Err(EngineError::Other("unexpected end of JSON input".to_string())),
                ],
                Some(PullScript::Records(records)) => records.iter().cloned().map(Ok).collect(),
                None => vec![
                    Ok(PullStatus::with_status(format!("Pulling from library/{}", image))),
                    Ok(PullStatus::with_status("Pull complete")),
                ],
            };
            (items, matches!(state.pulls.get(image), Some(PullScript::StreamStalls)))
        };

        let inner = if stalls {
            stream::iter(items).chain(stream::pending()).boxed()
        } else {
            stream::iter(items).boxed()
        };
        let tracked = TrackedStream {
            inner,
            released: self.released_streams.clone(),
        };
        Ok(tracked.boxed())
    }

    async fn create_container(&self, spec: &ContainerSpec) -> Result<ContainerId, EngineError> {
        self.record(Op::Create, &spec.name);

        let mut state = self.state.lock().unwrap();
        if state.panic_on_create.contains(&spec.name) {
            drop(state);
            panic!("engine client panicked creating {}", spec.name);
        }
        if !state.names.insert(spec.name.clone()) {
            return Err(EngineError::NameConflict {
                name: spec.name.clone(),
                message: format!("Conflict. The container name \"/{}\" is already in use", spec.name),
            });
        }

        state.next_id += 1;
        let id = ContainerId::new(format!("{:016x}{:048x}", state.next_id, 0));
        state.containers.insert(id.clone(), spec.name.clone());
        Ok(id)
    }

    async fn start_container(&self, id: &ContainerId) -> Result<(), EngineError> {
        let name = self.name_of(id)?;
        self.record(Op::Start, &name);

        if self.state.lock().unwrap().fail_start.contains(&name) {
            return Err(EngineError::Other("executable file not found in $PATH".to_string()));
        }
        Ok(())
    }

    async fn inspect_container(&self, id: &ContainerId) -> Result<ContainerInfo, EngineError> {
        let name = self.name_of(id)?;
        self.record(Op::Inspect, &name);

        if self.state.lock().unwrap().gone_before_wait.contains(&name) {
            return Err(EngineError::NotFound {
                subject: id.to_string(),
                message: format!("No such container: {}", id),
            });
        }
        Ok(ContainerInfo { running: true })
    }

    async fn wait_container(&self, id: &ContainerId) -> Result<i64, EngineError> {
        let name = self.name_of(id)?;
        self.record(Op::Wait, &name);

        let (hang, fail, delay, code) = {
            let mut state = self.state.lock().unwrap();
            state.waiting += 1;
            state.peak_waiting = state.peak_waiting.max(state.waiting);
            (
                state.hang_wait.contains(&name),
                state.fail_wait.contains(&name),
                state.wait_delays.get(&name).copied(),
                state.exit_codes.get(&name).copied().unwrap_or(0),
            )
        };

        if hang {
            std::future::pending::<()>().await;
        }
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        self.state.lock().unwrap().waiting -= 1;

        if fail {
            return Err(EngineError::Other("connection reset by peer".to_string()));
        }
        Ok(code)
    }

    async fn remove_container(&self, id: &ContainerId) -> Result<(), EngineError> {
        let name = self.name_of(id)?;
        self.record(Op::Remove, &name);

        let mut state = self.state.lock().unwrap();
        if state.fail_remove.contains(&name) {
            return Err(EngineError::Other("removal of container is already in progress".to_string()));
        }
        state.containers.remove(id);
        state.names.remove(&name);
        Ok(())
    }
}

/// Counts how many pull streams have been dropped.
struct TrackedStream {
    inner: PullStream,
    released: Arc<AtomicUsize>,
}

impl Stream for TrackedStream {
    type Item = Result<PullStatus, EngineError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner.as_mut().poll_next(cx)
    }
}

impl Drop for TrackedStream {
    fn drop(&mut self) {
        self.released.fetch_add(1, Ordering::SeqCst);
    }
}
