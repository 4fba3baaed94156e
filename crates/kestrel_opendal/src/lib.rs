//! # Kestrel OpenDAL Job Store
//!
//! A key-value job store powered by [Apache OpenDAL](https://opendal.apache.org/).
//!
//! Keeps the same layout a browser keeps in local storage: the job index under
//! `training-job-ui/index.json` and each payload under
//! `training-job-ui/payloads/<filename>`. Any OpenDAL service works; the memory
//! service stands in for local storage in a single process.
//!
//! ## Usage
//!
//! ```no_run
//! # use kestrel_opendal::OpendalJobStore;
//! # use opendal::{Operator, services::Memory};
//! let op = Operator::new(Memory::default()).unwrap().finish();
//! let store = OpendalJobStore::new(op);
//! ```

use kestrel_core::constants::keys;
use kestrel_core::prelude::*;
use opendal::Operator;
use std::sync::Arc;

fn backend(context: &str, e: opendal::Error) -> StoreError {
    StoreError::Backend(format!("OpenDAL {context} error: {e}"))
}

#[derive(Clone)]
pub struct OpendalJobStore {
    op: Operator,
    clock: Arc<dyn Clock>,
    status: Arc<dyn StatusSource>,
}

impl OpendalJobStore {
    /// Create a new store from an OpenDAL Operator.
    /// The Operator can be configured for any supported backend e.g., memory, fs, s3, etc.
    pub fn new(op: Operator) -> Self {
        Self {
            op,
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

    pub fn operator(&self) -> &Operator {
        &self.op
    }

    async fn read_index(&self) -> Result<Vec<StoredJob>, StoreError> {
        match self.op.read(keys::INDEX).await {
            Ok(buffer) => Ok(parse_index(&buffer.to_vec())),
            Err(e) if e.kind() == opendal::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(backend("read", e)),
        }
    }

    async fn write_index(&self, jobs: &[StoredJob]) -> Result<(), StoreError> {
        let data = serde_json::to_vec(jobs)?;
        self.op
            .write(keys::INDEX, data)
            .await
            .map_err(|e| backend("index write", e))?;
        Ok(())
    }
}

impl JobStore for OpendalJobStore {
    async fn list(&self) -> Result<Vec<StoredJob>, StoreError> {
        let mut jobs = self.read_index().await?;
        if advance_all(&mut jobs, self.clock.now_ms(), self.status.as_ref()) {
            self.write_index(&jobs).await?;
        }
        Ok(jobs)
    }

    async fn persist(&self, payload: &JobPayload, job: &StoredJob) -> Result<String, StoreError> {
        let filename = payload_filename(&payload.job_name, self.clock.now_ms());

        // Payload first: the index never names a job whose payload is missing.
        let data = serde_json::to_vec(payload)?;
        self.op
            .write(&format!("{}{filename}", keys::PAYLOAD_PREFIX), data)
            .await
            .map_err(|e| backend("payload write", e))?;

        let mut jobs = self.read_index().await?;
        upsert(&mut jobs, job.clone());
        self.write_index(&jobs).await?;

        tracing::debug!(job = %job.id, %filename, "Job persisted");
        Ok(filename)
    }

    async fn clear(&self) -> Result<(), StoreError> {
        let entries = match self.op.list_with(keys::ROOT).recursive(true).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == opendal::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(backend("list", e)),
        };

        let mut removed = 0usize;
        for entry in entries {
            if entry.metadata().is_dir() {
                continue;
            }
            self.op
                .delete(entry.path())
                .await
                .map_err(|e| backend("delete", e))?;
            removed += 1;
        }

        tracing::debug!(removed, "Cleared job store keys");
        Ok(())
    }
}
