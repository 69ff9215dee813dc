// src/dag/scheduler.rs

use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::engine::job::Job;
use crate::registry::EventRegistry;
use crate::task::{EventName, RaisedEvents, TaskName, TaskRef};

/// How a single task attempt settled.
#[derive(Debug, Clone)]
pub enum TaskOutcome {
    /// The body returned successfully with the events it actually raised.
    Success(RaisedEvents),
    /// The body failed (or timed out); the message is recorded against the
    /// task and none of its declared events are raised.
    Failed(String),
}

/// Per-job readiness state machine.
///
/// The scheduler owns no durable state of its own: the [`Job`] passed into
/// each method is the single source of truth (raised events, pending /
/// completed / failed sets), which is what makes crash-resume work. A
/// reloaded job drops straight back into the same decision logic.
///
/// Responsibilities:
/// - seeding a job's pending set from the dependency closure
/// - deciding which pending tasks are ready (all dependency events raised)
/// - applying task outcomes: union raised events, move tasks to
///   completed/failed
/// - widening the working set when a newly raised event is consumed by a
///   task outside the initial closure
pub struct Scheduler {
    registry: Arc<EventRegistry>,

    /// Tasks currently handed out by `take_ready` but not yet settled.
    /// Deliberately not part of the persisted job: an interrupted attempt
    /// must look "not completed" on resume.
    running: BTreeSet<TaskName>,
}

impl Scheduler {
    pub fn new(registry: Arc<EventRegistry>) -> Self {
        Self {
            registry,
            running: BTreeSet::new(),
        }
    }

    /// Collect pending tasks whose dependencies are satisfied, mark them as
    /// running, and return them in lexicographic name order.
    ///
    /// Seed tasks are treated as satisfied regardless of unmet dependency
    /// events, so "run task T and everything downstream" always executes T.
    ///
    /// A handed-out task stays in `pending_tasks` until its attempt settles
    /// in [`record_outcome`](Self::record_outcome): a checkpoint written
    /// while a batch-mate is still in flight must not lose it.
    pub fn take_ready(&mut self, job: &mut Job) -> Vec<TaskRef> {
        let candidates: Vec<TaskName> = job
            .pending_tasks
            .iter()
            .filter(|name| !self.running.contains(*name) && self.deps_satisfied(job, name))
            .cloned()
            .collect();

        let mut ready = Vec::new();
        for name in candidates {
            let Some(task) = self.registry.task(&name).map(Arc::clone) else {
                // Stale snapshot entry for a task no longer registered.
                warn!(task = %name, "pending task not found in registry; dropping");
                job.pending_tasks.remove(&name);
                continue;
            };
            debug!(task = %name, "dependencies satisfied; task is ready");
            self.running.insert(name);
            ready.push(task);
        }

        ready
    }

    /// Apply a settled attempt to the job.
    ///
    /// On success the returned events (clamped to the task's declared
    /// `produces` set) are unioned into `raised_events` and the working set
    /// is widened with any registry task that depends on a newly raised
    /// event. On failure nothing is raised, so dependents stay pending and
    /// are simply never picked up this run.
    pub fn record_outcome(&mut self, job: &mut Job, name: &str, outcome: TaskOutcome) {
        self.running.remove(name);
        job.pending_tasks.remove(name);

        match outcome {
            TaskOutcome::Success(raised) => {
                job.completed_tasks.insert(name.to_string());

                let raised = self.clamp_to_declared(name, raised);
                for event in raised {
                    if job.raised_events.insert(event.clone()) {
                        debug!(task = %name, event = %event, "event raised");
                        self.widen_for_event(job, &event);
                    }
                }
            }
            TaskOutcome::Failed(message) => {
                warn!(task = %name, error = %message, "task failed; dependents will be skipped");
                job.failed_tasks.insert(name.to_string(), message);
            }
        }
    }

    /// True when no attempt is in flight and nothing further can be started.
    pub fn is_settled(&self, job: &Job) -> bool {
        self.running.is_empty()
            && !job
                .pending_tasks
                .iter()
                .any(|name| self.deps_satisfied(job, name))
    }

    fn deps_satisfied(&self, job: &Job, name: &str) -> bool {
        if job.seed_tasks.contains(name) {
            return true;
        }
        match self.registry.task(name) {
            Some(task) => task
                .depends_on()
                .iter()
                .all(|event| job.raised_events.contains(event)),
            None => false,
        }
    }

    /// Drop events the task never declared producing, with a warning, so the
    /// declarations stay the single source of truth for the graph.
    fn clamp_to_declared(&self, name: &str, raised: RaisedEvents) -> RaisedEvents {
        let declared = match self.registry.task(name) {
            Some(task) => task.produces(),
            None => return raised,
        };

        let (kept, undeclared): (BTreeSet<EventName>, BTreeSet<EventName>) =
            raised.into_iter().partition(|e| declared.contains(e));

        for event in &undeclared {
            warn!(
                task = %name,
                event = %event,
                "task raised an event it does not declare producing; discarding"
            );
        }

        kept
    }

    /// Admit every registry task that depends on `event` and is not already
    /// part of this job, pending or settled.
    ///
    /// This is what allows the working set to grow beyond the initial
    /// closure: readiness is re-derived from the registry after every newly
    /// raised event instead of being fixed up front.
    fn widen_for_event(&mut self, job: &mut Job, event: &str) {
        for task in self.registry.tasks_depending_on(event) {
            let name = task.name();
            if job.pending_tasks.contains(name)
                || job.completed_tasks.contains(name)
                || job.failed_tasks.contains_key(name)
                || self.running.contains(name)
            {
                continue;
            }
            debug!(task = %name, event = %event, "admitting task into working set");
            job.pending_tasks.insert(name.to_string());
        }
    }
}
