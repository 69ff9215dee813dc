// src/engine/mod.rs

//! Job execution engine.
//!
//! This module ties together:
//! - the [`job`] state (raised events, completed / failed / pending tasks)
//! - the [`runner`] loop that seeds a job from the registry, executes ready
//!   tasks until none remain, and checkpoints the job state after every
//!   settled attempt so a crashed run can resume.

pub mod job;
pub mod runner;

pub use job::{Job, JobStatus};
pub use runner::{JobReport, Runner, RunnerOptions};
