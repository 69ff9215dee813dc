// src/state/memory.rs

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use crate::engine::job::Job;
use crate::errors::StateStoreError;
use crate::state::JobStateStore;

/// In-memory state store.
///
/// Thread-safe via `RwLock`; nothing survives a restart, which makes it
/// suitable for tests and for embedders that do not need crash-resume.
pub struct MemoryStateStore {
    jobs: RwLock<HashMap<String, Job>>,
}

impl MemoryStateStore {
    pub fn new() -> Self {
        Self {
            jobs: RwLock::new(HashMap::new()),
        }
    }

    /// Number of stored snapshots (test helper).
    pub fn len(&self) -> usize {
        self.jobs.read().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for MemoryStateStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl JobStateStore for MemoryStateStore {
    async fn save(&self, job: &Job) -> Result<(), StateStoreError> {
        let mut jobs = self
            .jobs
            .write()
            .map_err(|_| StateStoreError::io("state lock poisoned", poisoned()))?;
        jobs.insert(job.id.clone(), job.clone());
        Ok(())
    }

    async fn load(&self, job_id: &str) -> Result<Job, StateStoreError> {
        let jobs = self
            .jobs
            .read()
            .map_err(|_| StateStoreError::io("state lock poisoned", poisoned()))?;
        jobs.get(job_id)
            .cloned()
            .ok_or_else(|| StateStoreError::NotFound(job_id.to_string()))
    }

    async fn delete(&self, job_id: &str) -> Result<(), StateStoreError> {
        let mut jobs = self
            .jobs
            .write()
            .map_err(|_| StateStoreError::io("state lock poisoned", poisoned()))?;
        jobs.remove(job_id);
        Ok(())
    }
}

fn poisoned() -> std::io::Error {
    std::io::Error::other("a writer panicked while holding the lock")
}
