// src/errors.rs

//! Crate-wide error types.
//!
//! The structured enums below cover the failure classes the engine cares
//! about; `anyhow` is still used at the edges (config loading, task bodies)
//! where arbitrary error chains are more convenient than a fixed taxonomy.

use thiserror::Error;

use crate::task::{EventName, TaskName};

pub use anyhow::Result;

/// Registration-time errors. Both are fatal to process startup.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// A task type with this name has already been registered.
    #[error("duplicate task name: '{0}'")]
    DuplicateTaskName(TaskName),

    /// A task depends on an event that no registered task produces, so it
    /// could never become ready. Raised only in strict mode; otherwise the
    /// registry just logs a warning.
    #[error("task '{task}' depends on event '{event}' which no registered task produces")]
    UnknownEvent { task: TaskName, event: EventName },
}

/// Failure of a single task body.
///
/// Caught by the runner and recorded against the task; never propagated to
/// sibling tasks.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct TaskError(#[from] anyhow::Error);

impl TaskError {
    pub fn msg(message: impl Into<String>) -> Self {
        Self(anyhow::anyhow!(message.into()))
    }
}

/// Job State Store failures.
///
/// Any of these aborts the current run: without durable checkpointing the
/// engine cannot guarantee resume correctness.
#[derive(Debug, Error)]
pub enum StateStoreError {
    #[error("no stored state for job '{0}'")]
    NotFound(String),

    #[error("serializing job state: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
}

impl StateStoreError {
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }
}

/// Errors surfaced to the driver from `Runner` operations.
#[derive(Debug, Error)]
pub enum RunError {
    /// Checkpointing failed; the run was aborted mid-way. Already-completed
    /// tasks up to the last successful save remain valid.
    #[error("persisting job state: {0}")]
    Persistence(#[from] StateStoreError),

    /// A seed task name does not exist in the registry.
    #[error("unknown task: '{0}'")]
    UnknownTask(TaskName),

    #[error(transparent)]
    Registry(#[from] RegistryError),
}
