use kestrel_client::KestrelClient;
use kestrel_core::prelude::*;
use kestrel_fs::FileSystemJobStore;

/// The store a command talks to: a remote server, or the local data directory.
#[derive(Clone)]
pub enum CliStore {
    Fs(FileSystemJobStore),
    Http(KestrelClient),
}

impl CliStore {
    pub fn describe(&self) -> String {
        match self {
            CliStore::Fs(store) => store.root().display().to_string(),
            CliStore::Http(client) => client.base_url().to_string(),
        }
    }
}

impl JobStore for CliStore {
    async fn list(&self) -> Result<Vec<StoredJob>, StoreError> {
        match self {
            CliStore::Fs(store) => store.list().await,
            CliStore::Http(client) => client.list().await,
        }
    }

    async fn persist(&self, payload: &JobPayload, job: &StoredJob) -> Result<String, StoreError> {
        match self {
            CliStore::Fs(store) => store.persist(payload, job).await,
            CliStore::Http(client) => client.persist(payload, job).await,
        }
    }

    async fn clear(&self) -> Result<(), StoreError> {
        match self {
            CliStore::Fs(store) => store.clear().await,
            CliStore::Http(client) => client.clear().await,
        }
    }
}
