use crate::error::SchemaError;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use std::fmt;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum JobStatus {
    Pending,
    Running,
    Succeeded,
    Failed,
}

impl JobStatus {
    pub const ALL: [JobStatus; 4] = [
        JobStatus::Pending,
        JobStatus::Running,
        JobStatus::Succeeded,
        JobStatus::Failed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "Pending",
            JobStatus::Running => "Running",
            JobStatus::Succeeded => "Succeeded",
            JobStatus::Failed => "Failed",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|status| status.as_str() == raw)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The persisted summary of a submitted job.
///
/// Keyed by [`id`](Self::id), which is the job name. Re-submitting the same name
/// replaces the previous summary.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StoredJob {
    pub id: String,
    /// Display name of the algorithm, or the container image.
    pub algorithm: String,
    /// Epoch milliseconds.
    pub created_at: i64,
    pub priority: f64,
    pub status: JobStatus,
    /// Epoch milliseconds after which a `Pending` job may advance.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pending_until: Option<i64>,
}

/// Checks an untyped JSON value against the [`StoredJob`] shape.
///
/// Every deserialization boundary (index files, key-value entries, request bodies)
/// goes through this instead of trusting the stored bytes.
pub fn check_stored_job(value: &Value) -> Result<StoredJob, SchemaError> {
    let obj = value.as_object().ok_or(SchemaError::NotAnObject)?;

    let id = string_field(obj, "id")?;
    let algorithm = string_field(obj, "algorithm")?;
    let created_at = as_millis(number_field(obj, "createdAt")?);
    let priority = number_field(obj, "priority")?.as_f64().unwrap_or_default();
    let raw_status = string_field(obj, "status")?;
    let status = JobStatus::parse(&raw_status).ok_or(SchemaError::UnknownStatus(raw_status))?;

    // A non-numeric pendingUntil is ignored rather than rejected.
    let pending_until = match obj.get("pendingUntil") {
        Some(Value::Number(n)) => Some(as_millis(n)),
        _ => None,
    };

    Ok(StoredJob {
        id,
        algorithm,
        created_at,
        priority,
        status,
        pending_until,
    })
}

fn string_field(obj: &Map<String, Value>, field: &'static str) -> Result<String, SchemaError> {
    match obj.get(field) {
        None => Err(SchemaError::Missing(field)),
        Some(Value::String(s)) => Ok(s.clone()),
        Some(_) => Err(SchemaError::WrongType {
            field,
            expected: "string",
        }),
    }
}

fn number_field<'a>(obj: &'a Map<String, Value>, field: &'static str) -> Result<&'a Number, SchemaError> {
    match obj.get(field) {
        None => Err(SchemaError::Missing(field)),
        Some(Value::Number(n)) => Ok(n),
        Some(_) => Err(SchemaError::WrongType {
            field,
            expected: "number",
        }),
    }
}

fn as_millis(n: &Number) -> i64 {
    n.as_i64()
        .or_else(|| n.as_f64().map(|f| f as i64))
        .unwrap_or_default()
}

/// Reads a persisted index, silently dropping entries that fail [`check_stored_job`].
///
/// Anything that is not a JSON array yields an empty list.
pub fn parse_index(bytes: &[u8]) -> Vec<StoredJob> {
    let parsed: Value = match serde_json::from_slice(bytes) {
        Ok(v) => v,
        Err(e) => {
            tracing::warn!("Job index is not valid JSON, treating as empty: {e}");
            return Vec::new();
        }
    };

    let Value::Array(items) = parsed else {
        tracing::warn!("Job index is not an array, treating as empty");
        return Vec::new();
    };

    items
        .iter()
        .filter_map(|item| match check_stored_job(item) {
            Ok(job) => Some(job),
            Err(e) => {
                tracing::warn!("Dropping malformed job record: {e}");
                None
            }
        })
        .collect()
}

/// Removes any record with the same id and appends `job`.
pub fn upsert(index: &mut Vec<StoredJob>, job: StoredJob) {
    index.retain(|entry| entry.id != job.id);
    index.push(job);
}

/// Name of the payload blob for a submission: `<sanitised id>-<epoch ms>.json`.
///
/// Characters outside `[a-z0-9-_]` (case-insensitive) become `-`, and the result is lowercased.
pub fn payload_filename(job_id: &str, now_ms: i64) -> String {
    let safe: String = job_id
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c.to_ascii_lowercase()
            } else {
                '-'
            }
        })
        .collect();
    format!("{safe}-{now_ms}.json")
}

/// Whether `name` has the shape [`payload_filename`] produces.
pub fn is_payload_filename(name: &str) -> bool {
    let Some((safe, ms)) = name
        .strip_suffix(".json")
        .and_then(|stem| stem.rsplit_once('-'))
    else {
        return false;
    };
    !safe.is_empty()
        && safe
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_')
        && !ms.is_empty()
        && ms.chars().all(|c| c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn payload_filenames_are_recognised() {
        assert!(is_payload_filename(&payload_filename("Train job#1", 1_700_000_000_000)));
        assert!(is_payload_filename("train-abc123-0.json"));

        assert!(!is_payload_filename("index.json"));
        assert!(!is_payload_filename("notes.txt"));
        assert!(!is_payload_filename("Report-2024.json"));
        assert!(!is_payload_filename("train-abc.json"));
        assert!(!is_payload_filename("-12.json"));
    }

    #[test]
    fn check_accepts_well_formed_record() {
        let job = check_stored_job(&json!({
            "id": "train-abc123",
            "algorithm": "XGBoost",
            "createdAt": 1_700_000_000_000_i64,
            "priority": 500,
            "status": "Pending",
            "pendingUntil": 1_700_000_015_000_i64,
        }))
        .unwrap();

        assert_eq!(job.id, "train-abc123");
        assert_eq!(job.priority, 500.0);
        assert_eq!(job.status, JobStatus::Pending);
        assert_eq!(job.pending_until, Some(1_700_000_015_000));
    }

    #[test]
    fn check_rejects_bad_shapes() {
        assert_eq!(check_stored_job(&json!([1, 2])), Err(SchemaError::NotAnObject));
        assert_eq!(
            check_stored_job(&json!({"algorithm": "x", "createdAt": 1, "priority": 1, "status": "Pending"})),
            Err(SchemaError::Missing("id"))
        );
        assert_eq!(
            check_stored_job(&json!({"id": "a", "algorithm": "x", "createdAt": "now", "priority": 1, "status": "Pending"})),
            Err(SchemaError::WrongType {
                field: "createdAt",
                expected: "number"
            })
        );
        assert_eq!(
            check_stored_job(&json!({"id": "a", "algorithm": "x", "createdAt": 1, "priority": 1, "status": "Queued"})),
            Err(SchemaError::UnknownStatus("Queued".into()))
        );
    }

    #[test]
    fn non_numeric_pending_until_is_ignored() {
        let job = check_stored_job(&json!({
            "id": "a", "algorithm": "x", "createdAt": 1, "priority": 1,
            "status": "Running", "pendingUntil": "soon"
        }))
        .unwrap();
        assert_eq!(job.pending_until, None);
    }

    #[test]
    fn parse_index_drops_malformed_entries() {
        let raw = br#"[
            {"id": "ok", "algorithm": "XGBoost", "createdAt": 5, "priority": 1, "status": "Running"},
            {"id": 7},
            "junk"
        ]"#;
        let jobs = parse_index(raw);
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].id, "ok");

        assert!(parse_index(b"{\"not\": \"an array\"}").is_empty());
        assert!(parse_index(b"garbage").is_empty());
    }

    #[test]
    fn pending_until_is_omitted_when_unset() {
        let job = StoredJob {
            id: "a".into(),
            algorithm: "XGBoost".into(),
            created_at: 1,
            priority: 1.0,
            status: JobStatus::Running,
            pending_until: None,
        };
        let value = serde_json::to_value(&job).unwrap();
        assert!(value.get("pendingUntil").is_none());
        assert_eq!(value["createdAt"], json!(1));
    }

    #[test]
    fn upsert_replaces_same_id() {
        let mk = |id: &str, created_at| StoredJob {
            id: id.into(),
            algorithm: "XGBoost".into(),
            created_at,
            priority: 1.0,
            status: JobStatus::Pending,
            pending_until: None,
        };
        let mut index = vec![mk("a", 1), mk("b", 2)];
        upsert(&mut index, mk("a", 3));
        let ids: Vec<_> = index.iter().map(|j| (j.id.as_str(), j.created_at)).collect();
        assert_eq!(ids, vec![("b", 2), ("a", 3)]);
    }

    #[test]
    fn payload_filename_is_sanitised() {
        assert_eq!(payload_filename("train-abc123", 42), "train-abc123-42.json");
        assert_eq!(payload_filename("My Job/1", 7), "my-job-1-7.json");
    }
}
