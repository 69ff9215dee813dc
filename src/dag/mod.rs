// src/dag/mod.rs

//! Dependency graph and per-job scheduling.
//!
//! - [`graph`] derives the task-to-task graph from the registry's
//!   produces/depends_on declarations and computes closures over it.
//! - [`scheduler`] contains the per-job state machine that decides which
//!   tasks are ready to run as events get raised.

pub mod graph;
pub mod scheduler;

pub use graph::DepGraph;
pub use scheduler::{Scheduler, TaskOutcome};
