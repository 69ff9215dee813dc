// src/state/mod.rs

//! Job State Store: durable persistence of job snapshots.
//!
//! The store is the only interface into durable storage. The engine writes
//! a snapshot after every settled task attempt (not just at job end), so a
//! crash always leaves a resumable snapshot behind.
//!
//! - [`file`] persists one JSON file per job under a state directory, with
//!   atomic replace semantics.
//! - [`memory`] is a `HashMap`-backed store for tests and embedders.

pub mod file;
pub mod memory;

use async_trait::async_trait;

use crate::engine::job::Job;
use crate::errors::StateStoreError;

pub use file::FileStateStore;
pub use memory::MemoryStateStore;

/// Persistence contract for job snapshots.
///
/// Implementations must make `save` atomic from the perspective of a
/// subsequent `load`: a reader either sees the previous snapshot or the new
/// one, never a partial write.
#[async_trait]
pub trait JobStateStore: Send + Sync {
    /// Overwrite-persist the current snapshot of the job.
    async fn save(&self, job: &Job) -> Result<(), StateStoreError>;

    /// Load the last persisted snapshot for a job id.
    async fn load(&self, job_id: &str) -> Result<Job, StateStoreError>;

    /// Remove the snapshot for a job id.
    ///
    /// Deleting a snapshot that does not exist is not an error; the caller
    /// only cares that it is gone.
    async fn delete(&self, job_id: &str) -> Result<(), StateStoreError>;
}
