use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    /// Low-level I/O error.
    /// Maps to **HTTP 500 Internal Server Error**.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error.
    /// Maps to **HTTP 500 Internal Server Error**.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The submitted record was rejected before anything was written.
    /// Maps to **HTTP 400 Bad Request**.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Generic backend-specific failure (e.g., OpenDAL or HTTP transport error).
    /// Maps to **HTTP 500 Internal Server Error**.
    #[error("Store backend failure: {0}")]
    Backend(String),
}

/// Why a persisted value was not accepted as a [`StoredJob`](crate::job::StoredJob).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    #[error("expected a JSON object")]
    NotAnObject,

    #[error("field `{0}` is missing")]
    Missing(&'static str),

    #[error("field `{field}` must be a {expected}")]
    WrongType {
        field: &'static str,
        expected: &'static str,
    },

    #[error("unknown job status `{0}`")]
    UnknownStatus(String),
}
