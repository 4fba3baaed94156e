use crate::prelude::*;

use anyhow::Context;
use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use kestrel_core::prelude::*;
use serde_json::Value;
use tracing::{error, warn};

pub struct ApiError(anyhow::Error);

impl<E> From<E> for ApiError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let Some(StoreError::InvalidRequest(message)) = self.0.downcast_ref::<StoreError>() {
            return (StatusCode::BAD_REQUEST, Json(ErrorResponse::new(message.clone()))).into_response();
        }

        error!("Internal Server Error: {:?}", self.0);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse::new(self.0.to_string())),
        )
            .into_response()
    }
}

fn invalid(message: impl Into<String>) -> ApiError {
    StoreError::InvalidRequest(message.into()).into()
}

/// GET /api/jobs
pub async fn list_jobs<S: JobStore>(State(state): State<AppState<S>>) -> Response {
    match state.store().list().await {
        Ok(jobs) => Json(ListJobsResponse { ok: true, jobs }).into_response(),
        Err(e) => {
            error!("Failed to read job index: {e}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ListJobsResponse {
                    ok: false,
                    jobs: Vec::new(),
                }),
            )
                .into_response()
        }
    }
}

/// POST /api/jobs
/// Accepts `{ payload, job }`. The job summary is checked field by field before
/// anything is written.
pub async fn persist_job<S: JobStore>(
    State(state): State<AppState<S>>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<PersistJobResponse>, ApiError> {
    let Json(body) = body.map_err(|e| {
        warn!("Rejected job request body: {e}");
        invalid("Invalid payload")
    })?;

    let (Some(raw_payload @ Value::Object(_)), Some(raw_job @ Value::Object(_))) =
        (body.get("payload"), body.get("job"))
    else {
        return Err(invalid("Invalid payload structure"));
    };

    let job = check_stored_job(raw_job).map_err(|e| {
        warn!("Rejected job metadata: {e}");
        invalid("Invalid job metadata")
    })?;

    let payload: JobPayload = serde_json::from_value(raw_payload.clone()).map_err(|e| {
        warn!(job = %job.id, "Rejected job payload: {e}");
        invalid("Invalid payload structure")
    })?;

    let filename = state
        .store()
        .persist(&payload, &job)
        .await
        .context("Failed to save job payload")?;

    Ok(Json(PersistJobResponse {
        ok: true,
        filename,
        job,
    }))
}

/// DELETE /api/jobs
pub async fn clear_jobs<S: JobStore>(
    State(state): State<AppState<S>>,
) -> Result<Json<AckResponse>, ApiError> {
    state
        .store()
        .clear()
        .await
        .context("Failed to clear saved payloads")?;

    Ok(Json(AckResponse { ok: true }))
}
