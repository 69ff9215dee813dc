// src/registry.rs

//! Process-wide Event Registry.
//!
//! The registry is the static catalogue of every task type the process
//! knows about, indexed by the events they produce and depend on. It is
//! populated by explicit `register` calls during startup and treated as
//! read-only once jobs start running (by convention; there is no lock,
//! registration after the first run is undefined behaviour).

use std::collections::{BTreeMap, BTreeSet};

use petgraph::algo::tarjan_scc;
use petgraph::graphmap::DiGraphMap;
use tracing::{debug, warn};

use crate::errors::RegistryError;
use crate::task::{EventName, TaskName, TaskRef};

/// Explicit startup configuration for the registry.
///
/// This replaces ambient settings-driven task enablement: if
/// `enabled_tasks` is present, any task not named in it is skipped at
/// registration time.
#[derive(Debug, Clone, Default)]
pub struct RegistryConfig {
    /// When `Some`, only tasks named here are accepted by `register`.
    pub enabled_tasks: Option<BTreeSet<TaskName>>,

    /// When true, `validate` fails on events nobody produces instead of
    /// just warning.
    pub strict_events: bool,
}

/// Index of task types by name and by produced / consumed event.
pub struct EventRegistry {
    config: RegistryConfig,
    tasks: BTreeMap<TaskName, TaskRef>,

    /// event name -> names of tasks that declare it in `produces`.
    producers: BTreeMap<EventName, BTreeSet<TaskName>>,
    /// event name -> names of tasks that declare it in `depends_on`.
    consumers: BTreeMap<EventName, BTreeSet<TaskName>>,
}

impl EventRegistry {
    pub fn new() -> Self {
        Self::with_config(RegistryConfig::default())
    }

    pub fn with_config(config: RegistryConfig) -> Self {
        Self {
            config,
            tasks: BTreeMap::new(),
            producers: BTreeMap::new(),
            consumers: BTreeMap::new(),
        }
    }

    /// Register a task type, adding its declared events to the index.
    ///
    /// Tasks excluded by `RegistryConfig::enabled_tasks` are silently
    /// skipped (debug-logged). A second task with an already-registered
    /// name is an error.
    pub fn register(&mut self, task: TaskRef) -> Result<(), RegistryError> {
        let name = task.name().to_string();

        if let Some(enabled) = &self.config.enabled_tasks {
            if !enabled.contains(&name) {
                debug!(task = %name, "task not in enabled set; skipping registration");
                return Ok(());
            }
        }

        if self.tasks.contains_key(&name) {
            return Err(RegistryError::DuplicateTaskName(name));
        }

        for event in task.produces() {
            self.producers.entry(event).or_default().insert(name.clone());
        }
        for event in task.depends_on() {
            self.consumers.entry(event).or_default().insert(name.clone());
        }

        debug!(task = %name, "registered task");
        self.tasks.insert(name, task);
        Ok(())
    }

    /// Look up a task by name.
    pub fn task(&self, name: &str) -> Option<&TaskRef> {
        self.tasks.get(name)
    }

    /// All registered tasks, in name order.
    pub fn tasks(&self) -> impl Iterator<Item = &TaskRef> {
        self.tasks.values()
    }

    /// Names of all registered tasks, in order.
    pub fn task_names(&self) -> impl Iterator<Item = &str> {
        self.tasks.keys().map(|s| s.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Tasks that must be (re)considered when `event` is newly raised.
    pub fn tasks_depending_on(&self, event: &str) -> Vec<TaskRef> {
        self.named_tasks(self.consumers.get(event))
    }

    /// Tasks that declare `event` in their `produces` set.
    pub fn tasks_producing(&self, event: &str) -> Vec<TaskRef> {
        self.named_tasks(self.producers.get(event))
    }

    fn named_tasks(&self, names: Option<&BTreeSet<TaskName>>) -> Vec<TaskRef> {
        names
            .into_iter()
            .flatten()
            .filter_map(|name| self.tasks.get(name).cloned())
            .collect()
    }

    /// Check the registered tasks for consistency.
    ///
    /// - An event some task depends on but no task produces means that task
    ///   can only ever run as a seed. This is a warning, or an error when
    ///   `strict_events` is set.
    /// - Dependency cycles between tasks are reported at warn level but are
    ///   never fatal: each task still executes at most once per job, a cycle
    ///   just means the involved tasks are always in each other's closure.
    pub fn validate(&self) -> Result<(), RegistryError> {
        for (event, consumer_names) in &self.consumers {
            if self.producers.contains_key(event) {
                continue;
            }
            for task in consumer_names {
                warn!(
                    task = %task,
                    event = %event,
                    "task depends on an event which no registered task produces"
                );
                if self.config.strict_events {
                    return Err(RegistryError::UnknownEvent {
                        task: task.clone(),
                        event: event.clone(),
                    });
                }
            }
        }

        self.report_cycles();
        Ok(())
    }

    /// Log any dependency cycles between registered tasks.
    fn report_cycles(&self) {
        let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();

        for name in self.tasks.keys() {
            graph.add_node(name.as_str());
        }

        // Edge producer -> consumer for every shared event.
        for (event, producer_names) in &self.producers {
            let Some(consumer_names) = self.consumers.get(event) else {
                continue;
            };
            for producer in producer_names {
                for consumer in consumer_names {
                    if producer != consumer {
                        graph.add_edge(producer.as_str(), consumer.as_str(), ());
                    }
                }
            }
        }

        for component in tarjan_scc(&graph) {
            if component.len() > 1 {
                warn!(
                    tasks = ?component,
                    "dependency cycle between tasks; each still runs at most once per job"
                );
            }
        }
    }
}

impl Default for EventRegistry {
    fn default() -> Self {
        Self::new()
    }
}
