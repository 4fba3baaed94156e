use chrono::{DateTime, Local};
use kestrel_core::hyperparameters::{HyperparameterConfig, Render};
use kestrel_core::hyperparameters::fields::{Choice, FieldKind};
use kestrel_core::prelude::*;
use std::fmt::Write;

fn created_at(ms: i64) -> String {
    DateTime::from_timestamp_millis(ms)
        .map(|at| at.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| ms.to_string())
}

fn status(job: &StoredJob, now_ms: i64) -> String {
    match (job.status, job.pending_until) {
        (JobStatus::Pending, Some(until)) if until > now_ms => {
            format!("Pending ({}s)", until.saturating_sub(now_ms).saturating_add(999) / 1000)
        }
        (status, _) => status.to_string(),
    }
}

/// Newest-first job table followed by the status counts.
pub fn job_table(jobs: &[StoredJob], now_ms: i64) -> String {
    let mut out = String::new();
    if jobs.is_empty() {
        out.push_str("No training jobs yet.\n");
        return out;
    }

    let width = jobs.iter().map(|job| job.id.len()).max().unwrap_or(0).max(4);
    let _ = writeln!(
        out,
        "{:<width$}  {:<24}  {:>8}  {:<14}  CREATED",
        "NAME", "ALGORITHM", "PRIORITY", "STATUS"
    );
    for job in jobs {
        let _ = writeln!(
            out,
            "{:<width$}  {:<24}  {:>8}  {:<14}  {}",
            job.id,
            job.algorithm,
            job.priority,
            status(job, now_ms),
            created_at(job.created_at)
        );
    }

    let counts = StatusCounts::from_jobs(jobs);
    let _ = writeln!(
        out,
        "\n{} total, {} pending, {} running, {} succeeded, {} failed",
        counts.total, counts.pending, counts.running, counts.succeeded, counts.failed
    );
    out
}

fn kind(kind: &FieldKind) -> String {
    match kind {
        FieldKind::Number(bounds) => {
            let mut hint = String::from(if bounds.integer { "integer" } else { "number" });
            match (bounds.min.is_finite(), bounds.max.is_finite()) {
                (true, true) => {
                    let _ = write!(hint, " {}..={}", bounds.min, bounds.max);
                }
                (true, false) => {
                    let _ = write!(hint, " >= {}", bounds.min);
                }
                (false, true) => {
                    let _ = write!(hint, " <= {}", bounds.max);
                }
                (false, false) => {}
            }
            if bounds.allow_null {
                hint.push_str(", empty for none");
            }
            hint
        }
        FieldKind::Choice(choices) => {
            let options: Vec<String> = choices.iter().map(Choice::raw).collect();
            format!("one of {}", options.join("|"))
        }
        FieldKind::MultiSelect(options) => format!("any of {}", options.join(",")),
        FieldKind::AutoOrCount { min, .. } => format!("auto or integer >= {min}"),
    }
}

/// Field list and defaults of one algorithm, or its read-only notice.
pub fn algorithm_details(config: &HyperparameterConfig) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} ({})", config.label, config.id);

    if let Render::Placeholder { notice } = &config.render {
        let _ = writeln!(out, "{notice}");
        return out;
    }

    let mut section = "";
    for field in config.fields() {
        if field.section != section {
            section = field.section;
            let _ = writeln!(out, "\n[{section}]");
        }
        let default = config
            .default_values
            .get(field.key)
            .map(ToString::to_string)
            .unwrap_or_default();
        let _ = writeln!(
            out,
            "  {:<28} {:<16} {}  ({})",
            field.key,
            default,
            field.label,
            kind(&field.kind)
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use kestrel_core::hyperparameters;

    fn job(id: &str, status: JobStatus, pending_until: Option<i64>) -> StoredJob {
        StoredJob {
            id: id.into(),
            algorithm: "XGBoost".into(),
            created_at: 0,
            priority: 500.0,
            status,
            pending_until,
        }
    }

    #[test]
    fn table_lists_jobs_and_counts() {
        let jobs = vec![
            job("train-b", JobStatus::Pending, Some(10_500)),
            job("train-a", JobStatus::Running, None),
        ];
        let table = job_table(&jobs, 0);

        assert!(table.starts_with("NAME"));
        assert!(table.contains("Pending (11s)"));
        assert!(table.contains("Running"));
        assert!(table.contains("2 total, 1 pending, 1 running, 0 succeeded, 0 failed"));
        assert_eq!(job_table(&[], 0), "No training jobs yet.\n");
    }

    #[test]
    fn due_pending_jobs_show_plain_status() {
        let jobs = vec![job("train-a", JobStatus::Pending, Some(1_000))];
        assert!(job_table(&jobs, 1_000).contains("Pending "));
        assert!(!job_table(&jobs, 1_000).contains("Pending ("));
    }

    #[test]
    fn far_off_deadline_does_not_overflow() {
        let jobs = vec![job("train-a", JobStatus::Pending, Some(i64::MAX))];
        let table = job_table(&jobs, -1_000);
        assert!(table.contains(&format!("Pending ({}s)", i64::MAX / 1000)));
    }

    #[test]
    fn hyperparameter_listing() {
        let xgboost = algorithm_details(hyperparameters::get("xgboost").unwrap());
        assert!(xgboost.starts_with("XGBoost (xgboost)"));
        assert!(xgboost.contains("eta"));

        let placeholder = algorithm_details(hyperparameters::get("jax-pjit").unwrap());
        assert!(placeholder.contains("no inputs are defined yet"));
    }
}
