// src/engine/job.rs

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::task::{EventName, TaskName};

/// Terminal and non-terminal job states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Running,
    /// Every task that became ready executed successfully.
    Completed,
    /// At least one task failed. Completed tasks' results remain valid.
    Failed,
}

/// One execution instance of a set of interdependent tasks.
///
/// The job is owned exclusively by the [`Runner`](super::Runner) for its
/// lifetime and mutated only through the scheduler. It doubles as the
/// persisted snapshot: the struct serializes as-is into the Job State
/// Store, and a deserialized job drops straight back into the run loop.
///
/// Note what is *not* here: no "running" set. An attempt that was in flight
/// when the process died must look not-completed on resume so it gets
/// re-executed (task bodies are idempotent by contract).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: String,

    /// Tasks this job was seeded with. Seed tasks run even if their
    /// dependency events were never raised.
    pub seed_tasks: BTreeSet<TaskName>,

    /// Every event raised so far, seed events included.
    pub raised_events: BTreeSet<EventName>,

    /// Tasks whose `execute` returned successfully. Never re-executed
    /// within this job, including after a resume.
    pub completed_tasks: BTreeSet<TaskName>,

    /// Tasks whose `execute` failed, with the recorded error message.
    pub failed_tasks: BTreeMap<TaskName, String>,

    /// Tasks admitted to the working set whose dependencies are not all
    /// satisfied yet. Tasks still here when the run settles were skipped.
    pub pending_tasks: BTreeSet<TaskName>,

    pub status: JobStatus,
}

impl Job {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            seed_tasks: BTreeSet::new(),
            raised_events: BTreeSet::new(),
            completed_tasks: BTreeSet::new(),
            failed_tasks: BTreeMap::new(),
            pending_tasks: BTreeSet::new(),
            status: JobStatus::Running,
        }
    }

    /// Whether the job has reached a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self.status, JobStatus::Completed | JobStatus::Failed)
    }

    /// Derive the terminal status from the per-task record.
    pub fn settle(&mut self) {
        self.status = if self.failed_tasks.is_empty() {
            JobStatus::Completed
        } else {
            JobStatus::Failed
        };
    }
}
