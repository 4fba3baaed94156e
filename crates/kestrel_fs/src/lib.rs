//! # Kestrel FileSystem Job Store
//!
//! A local filesystem backend for Kestrel.
//!
//! This crate implements the [`JobStore`] trait, keeping the job index in
//! `<root>/index.json` and writing one pretty-printed payload file per
//! submission next to it.
//!
//! ## Features
//!
//! * **Atomic Writes**: Uses temporary files and rename operations so a reader never sees a half-written index or payload.
//! * **Self-healing reads**: Listing advances due `Pending` jobs and writes the result back.
//!
//! ## Usage
//!
//! ```no_run
//! use kestrel_fs::FileSystemJobStore;
//!
//! let store = FileSystemJobStore::new("./tmp/jobs");
//! ```

use kestrel_core::constants::defaults::INDEX_FILE;
use kestrel_core::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;

async fn atomic_write(path: &Path, data: Vec<u8>) -> Result<(), StoreError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await?;
    }

    let tmp_path = path.with_extension("tmp");

    fs::write(&tmp_path, data).await?;
    fs::rename(&tmp_path, path).await?;

    Ok(())
}

#[derive(Clone)]
pub struct FileSystemJobStore {
    root: PathBuf,
    clock: Arc<dyn Clock>,
    status: Arc<dyn StatusSource>,
}

impl FileSystemJobStore {
    /// A store rooted at `path`, using the system clock and the simulated pending delay.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            root: path.into(),
            clock: Arc::new(SystemClock),
            status: Arc::new(SimulatedDelay::default()),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_status_source(mut self, status: Arc<dyn StatusSource>) -> Self {
        self.status = status;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn index_path(&self) -> PathBuf {
        self.root.join(INDEX_FILE)
    }

    async fn read_index(&self) -> Result<Vec<StoredJob>, StoreError> {
        match fs::read(self.index_path()).await {
            Ok(data) => Ok(parse_index(&data)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(StoreError::Io(e)),
        }
    }

    async fn write_index(&self, jobs: &[StoredJob]) -> Result<(), StoreError> {
        let data = serde_json::to_vec_pretty(jobs)?;
        atomic_write(&self.index_path(), data).await
    }
}

impl JobStore for FileSystemJobStore {
    async fn list(&self) -> Result<Vec<StoredJob>, StoreError> {
        let mut jobs = self.read_index().await?;
        if advance_all(&mut jobs, self.clock.now_ms(), self.status.as_ref()) {
            self.write_index(&jobs).await?;
        }
        Ok(jobs)
    }

    async fn persist(&self, payload: &JobPayload, job: &StoredJob) -> Result<String, StoreError> {
        let filename = payload_filename(&payload.job_name, self.clock.now_ms());
        let data = serde_json::to_vec_pretty(payload)?;
        atomic_write(&self.root.join(&filename), data).await?;

        let mut jobs = self.read_index().await?;
        upsert(&mut jobs, job.clone());
        self.write_index(&jobs).await?;

        tracing::debug!(job = %job.id, %filename, "Job persisted");
        Ok(filename)
    }

    /// Removes the index and the payload files, leaving anything else in the
    /// directory alone. The directory itself goes only if it ends up empty.
    async fn clear(&self) -> Result<(), StoreError> {
        let mut entries = match fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(StoreError::Io(e)),
        };

        let mut removed = 0;
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            if name != INDEX_FILE && !is_payload_filename(name) {
                continue;
            }
            if entry.file_type().await?.is_file() {
                fs::remove_file(entry.path()).await?;
                removed += 1;
            }
        }

        if fs::remove_dir(&self.root).await.is_err() {
            tracing::debug!(root = %self.root.display(), "Job directory kept, it holds other files");
        }
        tracing::debug!(removed, "Job store cleared");
        Ok(())
    }
}
