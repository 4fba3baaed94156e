use crate::error::*;
use crate::job::StoredJob;
use crate::payload::JobPayload;

/// A trait for injecting job persistence into the server, the CLI and the list view.
pub trait JobStore: Send + Sync + 'static + Clone {
    /// Returns every stored job summary.
    ///
    /// Implementations advance due `Pending` records before returning and write
    /// the advanced set back.
    fn list(&self) -> impl Future<Output = Result<Vec<StoredJob>, StoreError>> + Send;

    /// Replaces any summary with the same id and writes the payload blob.
    ///
    /// Returns the name of the payload blob.
    fn persist(
        &self,
        payload: &JobPayload,
        job: &StoredJob,
    ) -> impl Future<Output = Result<String, StoreError>> + Send;

    /// Removes every summary and payload blob.
    fn clear(&self) -> impl Future<Output = Result<(), StoreError>> + Send;
}

/// Result of [`JobStoreExt::persist_job`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersistOutcome {
    Saved { filename: String },
    Failed,
}

impl PersistOutcome {
    pub fn is_saved(&self) -> bool {
        matches!(self, PersistOutcome::Saved { .. })
    }
}

/// Boundary wrappers that log store failures instead of returning them.
pub trait JobStoreExt: JobStore {
    fn persist_job(
        &self,
        payload: &JobPayload,
        job: &StoredJob,
    ) -> impl Future<Output = PersistOutcome> + Send {
        async move {
            match self.persist(payload, job).await {
                Ok(filename) => PersistOutcome::Saved { filename },
                Err(e) => {
                    tracing::error!(job = %job.id, "Failed to persist job: {e}");
                    PersistOutcome::Failed
                }
            }
        }
    }

    fn load_jobs(&self) -> impl Future<Output = Vec<StoredJob>> + Send {
        async move {
            self.list().await.unwrap_or_else(|e| {
                tracing::error!("Failed to list jobs: {e}");
                Vec::new()
            })
        }
    }
}

impl<T: JobStore> JobStoreExt for T {}
