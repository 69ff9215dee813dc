// src/engine/runner.rs

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::dag::graph::DepGraph;
use crate::dag::scheduler::{Scheduler, TaskOutcome};
use crate::engine::job::{Job, JobStatus};
use crate::errors::RunError;
use crate::registry::EventRegistry;
use crate::state::JobStateStore;
use crate::task::{EventName, JobContext, TaskName, TaskRef};

/// Options that influence how the runner behaves.
#[derive(Debug, Clone)]
pub struct RunnerOptions {
    /// Execute each ready batch concurrently instead of sequentially.
    ///
    /// Tasks inside one batch have no mutual dependency, so this is safe;
    /// outcomes are still applied to the job in deterministic name order by
    /// the single owning loop.
    pub parallel: bool,

    /// Upper bound on a single task execution. A timed-out task counts as
    /// failed; its process-external side effects are its own problem (task
    /// bodies are idempotent by contract).
    pub task_timeout: Option<Duration>,
}

impl Default for RunnerOptions {
    fn default() -> Self {
        Self {
            parallel: false,
            task_timeout: None,
        }
    }
}

/// Per-run result handed back to the driver.
///
/// Exit-code mapping and printing is the driver's concern; the report only
/// carries the facts.
#[derive(Debug, Clone)]
pub struct JobReport {
    pub job_id: String,
    pub status: JobStatus,
    pub completed: BTreeSet<TaskName>,
    pub failed: BTreeMap<TaskName, String>,
    /// Tasks that were admitted but never became ready (e.g. their producer
    /// failed or raised nothing).
    pub skipped: BTreeSet<TaskName>,
    /// True when the run stopped early because cancellation was requested.
    pub cancelled: bool,
}

/// Orchestrates jobs against a registry and a state store.
///
/// The runner owns the scheduling loop: seed a job, repeatedly execute
/// ready tasks, apply their outcomes, checkpoint the job state after every
/// settled attempt, and stop once nothing further can become ready.
pub struct Runner {
    registry: Arc<EventRegistry>,
    store: Arc<dyn JobStateStore>,
    options: RunnerOptions,
    cancel: CancellationToken,
}

impl Runner {
    pub fn new(
        registry: Arc<EventRegistry>,
        store: Arc<dyn JobStateStore>,
        options: RunnerOptions,
    ) -> Self {
        Self {
            registry,
            store,
            options,
            cancel: CancellationToken::new(),
        }
    }

    /// Token a driver can use to abort the run between task executions.
    /// A task already in flight completes or fails on its own.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn registry(&self) -> &Arc<EventRegistry> {
        &self.registry
    }

    /// Create a fresh job seeded with the given events and tasks.
    ///
    /// The pending set is the dependency closure of the seeds: every task
    /// reachable from a seed task (or from a consumer of a seed event) along
    /// produces -> depends_on edges. The working set can still grow beyond
    /// this during the run if new events widen it.
    pub fn start_job(
        &self,
        job_id: impl Into<String>,
        seed_events: Vec<EventName>,
        seed_tasks: Vec<TaskName>,
    ) -> Result<Job, RunError> {
        let mut job = Job::new(job_id);

        for name in seed_tasks {
            if self.registry.task(&name).is_none() {
                return Err(RunError::UnknownTask(name));
            }
            job.seed_tasks.insert(name);
        }
        job.raised_events = seed_events.into_iter().collect();

        let graph = DepGraph::from_registry(&self.registry);

        let mut roots: BTreeSet<TaskName> = job.seed_tasks.clone();
        for event in &job.raised_events {
            for task in self.registry.tasks_depending_on(event) {
                roots.insert(task.name().to_string());
            }
        }

        job.pending_tasks = graph.closure(roots.iter().map(|s| s.as_str()));

        info!(
            job = %job.id,
            seeds = job.seed_tasks.len(),
            events = job.raised_events.len(),
            closure = job.pending_tasks.len(),
            "job created"
        );
        Ok(job)
    }

    /// Reconstruct a job from its last persisted snapshot.
    ///
    /// Completed tasks stay completed and are never re-executed; pending
    /// tasks are re-evaluated against the recorded raised events. An attempt
    /// that was interrupted mid-execution was never recorded, so it simply
    /// runs again.
    pub async fn resume_job(&self, job_id: &str) -> Result<Job, RunError> {
        let mut job = self.store.load(job_id).await?;
        if job.is_terminal() {
            info!(job = %job.id, status = ?job.status, "resuming a job that already settled");
        }
        info!(
            job = %job.id,
            completed = job.completed_tasks.len(),
            pending = job.pending_tasks.len(),
            "resuming job from stored state"
        );
        job.status = JobStatus::Running;
        Ok(job)
    }

    /// The scheduling loop.
    ///
    /// Repeats until the ready set is empty: take ready tasks (lexicographic
    /// order), execute them, record outcomes, checkpoint after each settled
    /// attempt. A task failure is isolated: it marks the job as failed at
    /// the end but independent branches keep executing. A state-store
    /// failure aborts the run immediately.
    pub async fn run(&self, job: &mut Job) -> Result<JobReport, RunError> {
        job.status = JobStatus::Running;
        self.store.save(job).await?;

        let mut scheduler = Scheduler::new(Arc::clone(&self.registry));
        let mut cancelled = false;

        loop {
            if self.cancel.is_cancelled() {
                warn!(job = %job.id, "cancellation requested; stopping before next batch");
                cancelled = true;
                break;
            }

            let ready = scheduler.take_ready(job);
            if ready.is_empty() {
                break;
            }

            debug!(job = %job.id, batch = ready.len(), "executing ready batch");

            if self.options.parallel {
                self.run_batch_parallel(&mut scheduler, job, ready).await?;
            } else {
                self.run_batch_sequential(&mut scheduler, job, ready).await?;
            }
        }

        if cancelled {
            // Leave the job non-terminal so the driver can resume it later.
            self.store.save(job).await?;
        } else {
            debug_assert!(scheduler.is_settled(job));
            job.settle();
            self.store.save(job).await?;
            match job.status {
                JobStatus::Completed => info!(job = %job.id, "job completed"),
                JobStatus::Failed => warn!(
                    job = %job.id,
                    failed = job.failed_tasks.len(),
                    "job finished with failed tasks"
                ),
                JobStatus::Running => {}
            }
        }

        Ok(JobReport {
            job_id: job.id.clone(),
            status: job.status,
            completed: job.completed_tasks.clone(),
            failed: job.failed_tasks.clone(),
            skipped: job.pending_tasks.clone(),
            cancelled,
        })
    }

    async fn run_batch_sequential(
        &self,
        scheduler: &mut Scheduler,
        job: &mut Job,
        batch: Vec<TaskRef>,
    ) -> Result<(), RunError> {
        for task in batch {
            let name = task.name().to_string();
            let ctx = JobContext::new(&job.id, job.raised_events.clone());
            let outcome = execute_task(task, ctx, self.options.task_timeout).await;
            scheduler.record_outcome(job, &name, outcome);
            self.store.save(job).await?;
        }
        Ok(())
    }

    /// Execute a whole ready batch concurrently.
    ///
    /// All tasks in the batch see the same event snapshot (they are
    /// mutually independent), and outcomes are applied in name order once
    /// the whole batch has settled, so runs stay reproducible. Each handle
    /// is paired with its task name, so a panicking body settles as a
    /// failure of that task instead of vanishing from the bookkeeping.
    async fn run_batch_parallel(
        &self,
        scheduler: &mut Scheduler,
        job: &mut Job,
        batch: Vec<TaskRef>,
    ) -> Result<(), RunError> {
        let mut handles = Vec::with_capacity(batch.len());
        for task in batch {
            let name = task.name().to_string();
            let ctx = JobContext::new(&job.id, job.raised_events.clone());
            let timeout = self.options.task_timeout;
            let handle = tokio::spawn(async move { execute_task(task, ctx, timeout).await });
            handles.push((name, handle));
        }

        let mut outcomes: Vec<(TaskName, TaskOutcome)> = Vec::with_capacity(handles.len());
        for (name, handle) in handles {
            let outcome = match handle.await {
                Ok(outcome) => outcome,
                Err(err) => {
                    error!(task = %name, error = %err, "task execution panicked");
                    TaskOutcome::Failed(format!("task panicked: {err}"))
                }
            };
            outcomes.push((name, outcome));
        }

        outcomes.sort_by(|a, b| a.0.cmp(&b.0));
        for (name, outcome) in outcomes {
            scheduler.record_outcome(job, &name, outcome);
            self.store.save(job).await?;
        }
        Ok(())
    }
}

/// Execute one task body, translating errors and timeouts into an outcome.
async fn execute_task(task: TaskRef, ctx: JobContext, timeout: Option<Duration>) -> TaskOutcome {
    let name = task.name().to_string();
    info!(task = %name, "starting task");

    let result = match timeout {
        Some(limit) => match tokio::time::timeout(limit, task.execute(&ctx)).await {
            Ok(result) => result,
            Err(_) => {
                return TaskOutcome::Failed(format!(
                    "timed out after {:.1}s",
                    limit.as_secs_f64()
                ));
            }
        },
        None => task.execute(&ctx).await,
    };

    match result {
        Ok(raised) => {
            info!(task = %name, raised = raised.len(), "task completed");
            TaskOutcome::Success(raised)
        }
        Err(err) => TaskOutcome::Failed(err.to_string()),
    }
}
