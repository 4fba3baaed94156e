//! The job list: a read-only copy of the store that is refreshed on a poll and
//! advanced locally between polls.

use crate::clock::Clock;
use crate::constants::defaults::{POLL_INTERVAL_MS, TICK_INTERVAL_MS};
use crate::job::{JobStatus, StoredJob};
use crate::status::{StatusSource, advance_all};
use crate::traits::{JobStore, JobStoreExt};

use serde::Serialize;
use std::cmp::Reverse;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    pub total: usize,
    pub pending: usize,
    pub running: usize,
    pub succeeded: usize,
    pub failed: usize,
}

impl StatusCounts {
    pub fn from_jobs(jobs: &[StoredJob]) -> Self {
        jobs.iter().fold(Self::default(), |mut counts, job| {
            counts.total += 1;
            match job.status {
                JobStatus::Pending => counts.pending += 1,
                JobStatus::Running => counts.running += 1,
                JobStatus::Succeeded => counts.succeeded += 1,
                JobStatus::Failed => counts.failed += 1,
            }
            counts
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct JobListView {
    jobs: Vec<StoredJob>,
}

impl JobListView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the local copy with a fresh read from the store.
    pub fn replace(&mut self, jobs: Vec<StoredJob>) {
        self.jobs = jobs;
    }

    /// Advances due records without a round trip. Returns `true` if any changed.
    pub fn tick(&mut self, now_ms: i64, status: &dyn StatusSource) -> bool {
        advance_all(&mut self.jobs, now_ms, status)
    }

    pub fn jobs(&self) -> &[StoredJob] {
        &self.jobs
    }

    /// Newest first. Records with the same `created_at` keep store order.
    pub fn sorted(&self) -> Vec<StoredJob> {
        let mut jobs = self.jobs.clone();
        jobs.sort_by_key(|job| Reverse(job.created_at));
        jobs
    }

    pub fn summary(&self) -> StatusCounts {
        StatusCounts::from_jobs(&self.jobs)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ListViewConfig {
    /// How often the store is re-read.
    pub poll_interval: Duration,
    /// How often local `Pending` records are checked against the clock.
    pub tick_interval: Duration,
}

impl Default for ListViewConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(POLL_INTERVAL_MS),
            tick_interval: Duration::from_millis(TICK_INTERVAL_MS),
        }
    }
}

/// A running list view.
///
/// Owns one background task driving both timers; the sorted job list is
/// published through a watch channel. Dropping the session stops the task.
pub struct ListViewSession {
    receiver: watch::Receiver<Vec<StoredJob>>,
    handle: JoinHandle<()>,
}

impl ListViewSession {
    pub fn start<S: JobStore>(
        store: S,
        clock: Arc<dyn Clock>,
        status: Arc<dyn StatusSource>,
        config: ListViewConfig,
    ) -> Self {
        let (sender, receiver) = watch::channel(Vec::new());

        let handle = tokio::spawn(async move {
            let mut view = JobListView::new();

            let mut poll = tokio::time::interval(config.poll_interval);
            poll.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let mut tick = tokio::time::interval(config.tick_interval);
            tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    biased;
                    _ = poll.tick() => {
                        view.replace(store.load_jobs().await);
                        tracing::debug!(jobs = view.jobs().len(), "Job list refreshed");
                        sender.send_replace(view.sorted());
                    }
                    _ = tick.tick() => {
                        if view.tick(clock.now_ms(), status.as_ref()) {
                            sender.send_replace(view.sorted());
                        }
                    }
                }
            }
        });

        Self { receiver, handle }
    }

    pub fn subscribe(&self) -> watch::Receiver<Vec<StoredJob>> {
        self.receiver.clone()
    }

    /// The latest published list, newest first.
    pub fn jobs(&self) -> Vec<StoredJob> {
        self.receiver.borrow().clone()
    }
}

impl Drop for ListViewSession {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
