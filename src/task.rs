// src/task.rs

//! Task definitions.
//!
//! A task is a unit of idempotent work that declares:
//! - which events it *depends on* (it only becomes ready once all of them
//!   have been raised in the current job), and
//! - which events it may *produce* on success.
//!
//! Events are pure signals: a name, no payload. Their presence in a job's
//! raised set is what drives scheduling.

use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;

use crate::errors::TaskError;

/// Public type alias for task names throughout the engine.
pub type TaskName = String;

/// Public type alias for event names throughout the engine.
pub type EventName = String;

/// The set of events a task reports as raised after executing.
///
/// `BTreeSet` so that iteration (and therefore logging / persistence /
/// scheduling order) is deterministic.
pub type RaisedEvents = BTreeSet<EventName>;

/// Shared handle to a task; the registry and scheduler only ever deal in
/// these.
pub type TaskRef = Arc<dyn Task>;

/// Read-only view handed to a task body while it executes.
///
/// Tasks can inspect which events have been raised so far (e.g. to decide
/// whether anything actually changed), but cannot mutate job state directly;
/// the only way to influence the run is through the returned event set.
#[derive(Debug, Clone)]
pub struct JobContext {
    job_id: String,
    raised_events: BTreeSet<EventName>,
}

impl JobContext {
    pub fn new(job_id: impl Into<String>, raised_events: BTreeSet<EventName>) -> Self {
        Self {
            job_id: job_id.into(),
            raised_events,
        }
    }

    /// Identifier of the job this execution belongs to.
    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    /// All events raised in the job so far, including seed events.
    pub fn raised_events(&self) -> &BTreeSet<EventName> {
        &self.raised_events
    }

    /// Whether a specific event has been raised.
    pub fn event_raised(&self, event: &str) -> bool {
        self.raised_events.contains(event)
    }
}

/// A registered unit of work.
///
/// Contract:
/// - `execute` must be **idempotent**: state is persisted only after an
///   attempt settles, so a crash mid-execution makes the task look
///   "not completed" on resume and it will be executed again.
/// - On success, `execute` returns the subset of its declared `produces`
///   that actually occurred this run. Returning an empty set is normal and
///   means "nothing changed"; dependents then stay unscheduled.
/// - Events outside the declared `produces` set are discarded by the
///   scheduler (with a warning), so declarations stay the single source of
///   truth for graph construction.
#[async_trait]
pub trait Task: Send + Sync {
    /// Unique name of this task within the registry.
    fn name(&self) -> &str;

    /// Events this task may raise on success.
    fn produces(&self) -> BTreeSet<EventName> {
        BTreeSet::new()
    }

    /// Events that must all be raised before this task becomes ready.
    ///
    /// A task with an empty dependency set is immediately ready when seeded.
    fn depends_on(&self) -> BTreeSet<EventName> {
        BTreeSet::new()
    }

    /// Perform the work. See the trait-level contract notes.
    async fn execute(&self, ctx: &JobContext) -> Result<RaisedEvents, TaskError>;
}
