use crate::constants::defaults::PENDING_DELAY_MS;
use crate::job::{JobStatus, StoredJob};

/// Decides the status a job starts in and when it moves on.
///
/// Stores apply [`advance`](StatusSource::advance) on every read and the list view
/// applies it on every local tick, so a real scheduler signal can replace the
/// simulated delay without touching either.
pub trait StatusSource: Send + Sync + 'static {
    /// Status and optional `pending_until` for a job submitted at `now_ms`.
    fn initial(&self, now_ms: i64) -> (JobStatus, Option<i64>);

    /// Moves `job` forward if it is due. Returns `true` if the record changed.
    fn advance(&self, job: &mut StoredJob, now_ms: i64) -> bool;
}

/// Holds every job in `Pending` for a fixed delay, then reports it `Running`.
#[derive(Clone, Copy, Debug)]
pub struct SimulatedDelay {
    pub delay_ms: i64,
}

impl Default for SimulatedDelay {
    fn default() -> Self {
        Self {
            delay_ms: PENDING_DELAY_MS,
        }
    }
}

impl StatusSource for SimulatedDelay {
    fn initial(&self, now_ms: i64) -> (JobStatus, Option<i64>) {
        (JobStatus::Pending, Some(now_ms.saturating_add(self.delay_ms)))
    }

    fn advance(&self, job: &mut StoredJob, now_ms: i64) -> bool {
        match (job.status, job.pending_until) {
            (JobStatus::Pending, Some(until)) if now_ms >= until => {
                job.status = JobStatus::Running;
                job.pending_until = None;
                true
            }
            _ => false,
        }
    }
}

/// Applies `source` to every job. Returns `true` if any record changed.
pub fn advance_all(jobs: &mut [StoredJob], now_ms: i64, source: &dyn StatusSource) -> bool {
    let mut mutated = false;
    for job in jobs.iter_mut() {
        if source.advance(job, now_ms) {
            tracing::debug!(job = %job.id, "Job advanced to {}", job.status);
            mutated = true;
        }
    }
    mutated
}
