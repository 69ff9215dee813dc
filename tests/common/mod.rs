#![allow(dead_code)]

//! Shared test fixtures: a programmable stub task and wiring helpers.

use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use eventdag::engine::{Runner, RunnerOptions};
use eventdag::errors::TaskError;
use eventdag::registry::{EventRegistry, RegistryConfig};
use eventdag::state::{JobStateStore, MemoryStateStore};
use eventdag::task::{EventName, JobContext, RaisedEvents, Task};

/// Shared record of task executions, in order.
pub type ExecutionLog = Arc<Mutex<Vec<String>>>;

pub fn new_log() -> ExecutionLog {
    Arc::new(Mutex::new(Vec::new()))
}

pub fn log_entries(log: &ExecutionLog) -> Vec<String> {
    log.lock().unwrap().clone()
}

/// A task whose declarations and behaviour are fixed at construction time.
///
/// By default it raises everything it declares producing; `raises` can
/// shrink that (a task may legally produce none of its declared events),
/// `fails` makes the body error out, `panics` makes it unwind, and `delay`
/// simulates slow work.
pub struct StubTask {
    name: String,
    produces: BTreeSet<EventName>,
    depends_on: BTreeSet<EventName>,
    raises: BTreeSet<EventName>,
    fail: bool,
    panic: bool,
    delay: Option<Duration>,
    log: ExecutionLog,
}

impl StubTask {
    pub fn new(name: &str, log: &ExecutionLog) -> Self {
        Self {
            name: name.to_string(),
            produces: BTreeSet::new(),
            depends_on: BTreeSet::new(),
            raises: BTreeSet::new(),
            fail: false,
            panic: false,
            delay: None,
            log: Arc::clone(log),
        }
    }

    pub fn produces(mut self, events: &[&str]) -> Self {
        self.produces = events.iter().map(|s| s.to_string()).collect();
        self.raises = self.produces.clone();
        self
    }

    pub fn depends_on(mut self, events: &[&str]) -> Self {
        self.depends_on = events.iter().map(|s| s.to_string()).collect();
        self
    }

    /// Override the events actually raised on success (default: all of
    /// `produces`).
    pub fn raises(mut self, events: &[&str]) -> Self {
        self.raises = events.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn fails(mut self) -> Self {
        self.fail = true;
        self
    }

    pub fn panics(mut self) -> Self {
        self.panic = true;
        self
    }

    pub fn delay(mut self, duration: Duration) -> Self {
        self.delay = Some(duration);
        self
    }
}

#[async_trait]
impl Task for StubTask {
    fn name(&self) -> &str {
        &self.name
    }

    fn produces(&self) -> BTreeSet<EventName> {
        self.produces.clone()
    }

    fn depends_on(&self) -> BTreeSet<EventName> {
        self.depends_on.clone()
    }

    async fn execute(&self, _ctx: &JobContext) -> Result<RaisedEvents, TaskError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        self.log.lock().unwrap().push(self.name.clone());

        if self.panic {
            panic!("task '{}' was told to panic", self.name);
        }
        if self.fail {
            Err(TaskError::msg(format!("task '{}' was told to fail", self.name)))
        } else {
            Ok(self.raises.clone())
        }
    }
}

/// Register the given tasks into a fresh registry.
pub fn registry_of(tasks: Vec<StubTask>) -> Arc<EventRegistry> {
    registry_with_config(RegistryConfig::default(), tasks)
}

pub fn registry_with_config(config: RegistryConfig, tasks: Vec<StubTask>) -> Arc<EventRegistry> {
    let mut registry = EventRegistry::with_config(config);
    for task in tasks {
        registry.register(Arc::new(task)).expect("registration failed");
    }
    Arc::new(registry)
}

/// Runner wired to an in-memory store, plus a handle to the store itself so
/// tests can inspect snapshots.
pub fn runner_of(registry: Arc<EventRegistry>) -> (Runner, Arc<MemoryStateStore>) {
    runner_with_options(registry, RunnerOptions::default())
}

pub fn runner_with_options(
    registry: Arc<EventRegistry>,
    options: RunnerOptions,
) -> (Runner, Arc<MemoryStateStore>) {
    let store = Arc::new(MemoryStateStore::new());
    let runner = Runner::new(registry, Arc::clone(&store) as Arc<dyn JobStateStore>, options);
    (runner, store)
}
