//! Request and response bodies of the `/api/jobs` routes.

use crate::job::StoredJob;
use crate::payload::JobPayload;

use serde::{Deserialize, Serialize};

/// Body of `POST /api/jobs`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistJobRequest {
    pub payload: JobPayload,
    pub job: StoredJob,
}

/// Body of a successful `GET /api/jobs`. On failure `ok` is `false` and `jobs` is empty.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListJobsResponse {
    pub ok: bool,
    #[serde(default)]
    pub jobs: Vec<StoredJob>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistJobResponse {
    pub ok: bool,
    pub filename: String,
    pub job: StoredJob,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AckResponse {
    pub ok: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub ok: bool,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            message: message.into(),
        }
    }
}
