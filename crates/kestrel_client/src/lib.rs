//! # Kestrel Client
//!
//! An async HTTP client for interacting with a Kestrel Server.
//!
//! Used by the CLI to list, submit and clear jobs on a remote store. The client
//! implements [`JobStore`] itself, so anything written against the trait (the
//! form session, the list view) works unchanged against a server.
//!
//! ## Example: Submitting a job
//!
//! ```no_run
//!  use kestrel_client::KestrelClient;
//!  use kestrel_core::prelude::*;
//!
//!  async fn run() -> kestrel_client::Result<()> {
//!     let client = KestrelClient::new("http://localhost:3000");
//!
//!     let form = TrainingJobForm::new();
//!     let job = StoredJob::for_submission(&form, SystemClock.now_ms(), &SimulatedDelay::default());
//!     let saved = client.store_job(&to_payload(&form), &job).await?;
//!     println!("stored as {}", saved.filename);
//!
//!     for job in client.list_jobs().await? {
//!         println!("{} {}", job.id, job.status);
//!     }
//!     Ok(())
//! }
//! ```

use kestrel_core::constants::routes::JOBS;
use kestrel_core::prelude::*;
use reqwest::{Client, StatusCode, Url};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum KestrelClientError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Server returned error {0}: {1}")]
    ServerError(StatusCode, String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL: {0}")]
    UrlParse(#[from] url::ParseError),
}

impl From<KestrelClientError> for StoreError {
    fn from(err: KestrelClientError) -> Self {
        match err {
            KestrelClientError::ServerError(StatusCode::BAD_REQUEST, message) => {
                StoreError::InvalidRequest(message)
            }
            other => StoreError::Backend(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, KestrelClientError>;

#[derive(Clone)]
pub struct KestrelClient {
    base_url: String,
    client: Client,
}

impl KestrelClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            client: Client::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn jobs_url(&self) -> Result<Url> {
        let base = self.base_url.trim_end_matches('/');
        Ok(Url::parse(&format!("{base}{JOBS}"))?)
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response> {
        if response.status().is_success() {
            return Ok(response);
        }

        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorResponse>(&text)
            .map(|e| e.message)
            .unwrap_or(text);
        Err(KestrelClientError::ServerError(status, message))
    }

    pub async fn list_jobs(&self) -> Result<Vec<StoredJob>> {
        let response = self.client.get(self.jobs_url()?).send().await?;
        let response = Self::check(response).await?;

        let data: ListJobsResponse = response
            .json()
            .await
            .map_err(|e| KestrelClientError::Validation(format!("Failed to parse job list: {e}")))?;

        Ok(data.jobs)
    }

    pub async fn store_job(&self, payload: &JobPayload, job: &StoredJob) -> Result<PersistJobResponse> {
        let req = PersistJobRequest {
            payload: payload.clone(),
            job: job.clone(),
        };

        let response = self.client.post(self.jobs_url()?).json(&req).send().await?;
        let response = Self::check(response).await?;

        response
            .json()
            .await
            .map_err(|e| KestrelClientError::Validation(format!("Failed to parse persist response: {e}")))
    }

    pub async fn clear_jobs(&self) -> Result<()> {
        let response = self.client.delete(self.jobs_url()?).send().await?;
        Self::check(response).await?;
        Ok(())
    }
}

impl JobStore for KestrelClient {
    async fn list(&self) -> std::result::Result<Vec<StoredJob>, StoreError> {
        Ok(self.list_jobs().await?)
    }

    async fn persist(&self, payload: &JobPayload, job: &StoredJob) -> std::result::Result<String, StoreError> {
        let saved = self.store_job(payload, job).await?;
        tracing::debug!(job = %saved.job.id, filename = %saved.filename, "Job stored on server");
        Ok(saved.filename)
    }

    async fn clear(&self) -> std::result::Result<(), StoreError> {
        Ok(self.clear_jobs().await?)
    }
}
