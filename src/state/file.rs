// src/state/file.rs

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tracing::{debug, info};

use crate::engine::job::Job;
use crate::errors::StateStoreError;
use crate::state::JobStateStore;

/// File-backed state store: one JSON document per job id under a state
/// directory (default `.eventdag/jobs`).
///
/// Atomicity: snapshots are written to a `.tmp` sibling and renamed into
/// place. Rename within one directory is atomic on the platforms we care
/// about, so `load` never observes a half-written snapshot.
pub struct FileStateStore {
    dir: PathBuf,
}

/// Default state directory, relative to the current working directory.
pub const DEFAULT_STATE_DIR: &str = ".eventdag/jobs";

impl FileStateStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn job_path(&self, job_id: &str) -> PathBuf {
        // Job ids come from callers; keep the file name safe.
        let safe: String = job_id
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.dir.join(format!("{safe}.json"))
    }
}

impl Default for FileStateStore {
    fn default() -> Self {
        Self::new(DEFAULT_STATE_DIR)
    }
}

#[async_trait]
impl JobStateStore for FileStateStore {
    async fn save(&self, job: &Job) -> Result<(), StateStoreError> {
        fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| StateStoreError::io(format!("creating state dir {:?}", self.dir), e))?;

        let body = serde_json::to_vec_pretty(job)?;

        let path = self.job_path(&job.id);
        let tmp = path.with_extension("json.tmp");

        fs::write(&tmp, &body)
            .await
            .map_err(|e| StateStoreError::io(format!("writing snapshot to {tmp:?}"), e))?;
        fs::rename(&tmp, &path)
            .await
            .map_err(|e| StateStoreError::io(format!("renaming {tmp:?} into place"), e))?;

        debug!(job = %job.id, path = ?path, "saved job snapshot");
        Ok(())
    }

    async fn load(&self, job_id: &str) -> Result<Job, StateStoreError> {
        let path = self.job_path(job_id);

        let body = match fs::read(&path).await {
            Ok(body) => body,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StateStoreError::NotFound(job_id.to_string()));
            }
            Err(e) => {
                return Err(StateStoreError::io(
                    format!("reading snapshot from {path:?}"),
                    e,
                ));
            }
        };

        let job: Job = serde_json::from_slice(&body)?;
        debug!(job = %job.id, path = ?path, "loaded job snapshot");
        Ok(job)
    }

    async fn delete(&self, job_id: &str) -> Result<(), StateStoreError> {
        let path = self.job_path(job_id);
        match fs::remove_file(&path).await {
            Ok(()) => {
                info!(job = %job_id, "deleted job snapshot");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(job = %job_id, "no snapshot to delete");
                Ok(())
            }
            Err(e) => Err(StateStoreError::io(
                format!("deleting snapshot at {path:?}"),
                e,
            )),
        }
    }
}
