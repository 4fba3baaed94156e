//! An in-process [`JobStore`] used by the list view and form session tests, and
//! by anything that wants the store contract without I/O.

use crate::clock::Clock;
use crate::error::StoreError;
use crate::job::{StoredJob, payload_filename, upsert};
use crate::payload::JobPayload;
use crate::status::{StatusSource, advance_all};
use crate::traits::JobStore;

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct Inner {
    index: Vec<StoredJob>,
    payloads: BTreeMap<String, JobPayload>,
}

#[derive(Clone)]
pub struct MemoryJobStore {
    inner: Arc<Mutex<Inner>>,
    clock: Arc<dyn Clock>,
    status: Arc<dyn StatusSource>,
}

impl MemoryJobStore {
    pub fn new(clock: Arc<dyn Clock>, status: Arc<dyn StatusSource>) -> Self {
        Self {
            inner: Arc::default(),
            clock,
            status,
        }
    }

    /// The payload stored under `filename`, if any.
    pub fn payload(&self, filename: &str) -> Option<JobPayload> {
        self.lock().ok()?.payloads.get(filename).cloned()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Inner>, StoreError> {
        self.inner
            .lock()
            .map_err(|_| StoreError::Backend("memory store lock poisoned".into()))
    }
}

impl JobStore for MemoryJobStore {
    async fn list(&self) -> Result<Vec<StoredJob>, StoreError> {
        let now = self.clock.now_ms();
        let mut inner = self.lock()?;
        advance_all(&mut inner.index, now, self.status.as_ref());
        Ok(inner.index.clone())
    }

    async fn persist(&self, payload: &JobPayload, job: &StoredJob) -> Result<String, StoreError> {
        let filename = payload_filename(&payload.job_name, self.clock.now_ms());
        let mut inner = self.lock()?;
        upsert(&mut inner.index, job.clone());
        inner.payloads.insert(filename.clone(), payload.clone());
        Ok(filename)
    }

    async fn clear(&self) -> Result<(), StoreError> {
        let mut inner = self.lock()?;
        inner.index.clear();
        inner.payloads.clear();
        Ok(())
    }
}
