use crate::clock::Clock;
use crate::form::TrainingJobForm;
use crate::job::StoredJob;
use crate::payload::{JobPayload, to_payload};
use crate::status::StatusSource;
use crate::traits::{JobStore, JobStoreExt, PersistOutcome};
use crate::validate::validate;

use std::sync::Arc;

#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// Nothing was sent to the store.
    Rejected { errors: Vec<String> },
    /// The job was accepted. `persisted` says whether the store kept a copy.
    Created { job: StoredJob, persisted: PersistOutcome },
}

impl SubmitOutcome {
    pub fn message(&self) -> String {
        match self {
            SubmitOutcome::Rejected { .. } => "Fix form errors and try again.".to_string(),
            SubmitOutcome::Created {
                persisted: PersistOutcome::Saved { filename },
                ..
            } => format!("Training job created. JSON stored locally as {filename}."),
            SubmitOutcome::Created {
                persisted: PersistOutcome::Failed,
                ..
            } => "Training job created. Local copy could not be saved (check logs).".to_string(),
        }
    }
}

/// The single owner of one training-job draft.
///
/// Dropping the session discards the draft.
pub struct FormSession {
    form: TrainingJobForm,
    clock: Arc<dyn Clock>,
    status: Arc<dyn StatusSource>,
}

impl FormSession {
    pub fn new(clock: Arc<dyn Clock>, status: Arc<dyn StatusSource>) -> Self {
        Self::with_form(TrainingJobForm::new(), clock, status)
    }

    pub fn with_form(form: TrainingJobForm, clock: Arc<dyn Clock>, status: Arc<dyn StatusSource>) -> Self {
        Self { form, clock, status }
    }

    pub fn form(&self) -> &TrainingJobForm {
        &self.form
    }

    /// Runs one updater against the draft.
    pub fn apply(&mut self, update: impl FnOnce(TrainingJobForm) -> TrainingJobForm) -> &mut Self {
        let form = std::mem::take(&mut self.form);
        self.form = update(form);
        self
    }

    pub fn errors(&self) -> Vec<String> {
        validate(&self.form)
    }

    pub fn payload(&self) -> JobPayload {
        to_payload(&self.form)
    }

    /// Validates, then persists the payload and its summary in one store call.
    ///
    /// A store failure still yields [`SubmitOutcome::Created`].
    pub async fn submit<S: JobStore>(&self, store: &S) -> SubmitOutcome {
        let errors = self.errors();
        if !errors.is_empty() {
            tracing::debug!(errors = errors.len(), "Submission rejected");
            return SubmitOutcome::Rejected { errors };
        }

        let payload = self.payload();
        let job = StoredJob::for_submission(&self.form, self.clock.now_ms(), self.status.as_ref());
        let persisted = store.persist_job(&payload, &job).await;
        tracing::info!(job = %job.id, saved = persisted.is_saved(), "Training job created");

        SubmitOutcome::Created { job, persisted }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::form::{ChannelPatch, FormField, OutputDataConfig, StorageProvider};
    use crate::job::JobStatus;
    use crate::status::SimulatedDelay;
    use crate::store::MemoryJobStore;
    use crate::store::testing::BrokenStore;

    fn collaborators(clock: &ManualClock) -> (Arc<dyn Clock>, Arc<dyn StatusSource>) {
        (Arc::new(clock.clone()), Arc::new(SimulatedDelay::default()))
    }

    #[tokio::test]
    async fn submit_list_advance_clear_scenario() {
        let clock = ManualClock::new(1_700_000_000_000);
        let (c, s) = collaborators(&clock);
        let store = MemoryJobStore::new(c.clone(), s.clone());

        let mut session = FormSession::new(c, s);
        let train = session.form().input_data_config[0].id.clone();
        session
            .apply(|f| f.set_field(FormField::JobName("train-abc123".into())))
            .apply(|f| {
                f.update_channel(
                    &train,
                    ChannelPatch {
                        provider: Some(StorageProvider::Minio),
                        bucket: Some("b".into()),
                        prefix: Some("p".into()),
                        ..Default::default()
                    },
                )
            })
            .apply(|f| {
                f.set_field(FormField::OutputDataConfig(OutputDataConfig {
                    artifact_uri: "storage://out/".into(),
                }))
            });
        assert!(session.errors().is_empty());

        let outcome = session.submit(&store).await;
        let SubmitOutcome::Created {
            persisted: PersistOutcome::Saved { filename },
            ..
        } = &outcome
        else {
            panic!("unexpected outcome {outcome:?}");
        };
        assert!(filename.contains("train-abc123"));
        assert!(outcome.message().starts_with("Training job created. JSON stored locally as"));

        let jobs = store.list().await.unwrap();
        assert_eq!(jobs[0].id, "train-abc123");
        assert_eq!(jobs[0].status, JobStatus::Pending);

        clock.advance(15_001);
        let jobs = store.list().await.unwrap();
        assert_eq!(jobs[0].status, JobStatus::Running);
        assert_eq!(jobs[0].pending_until, None);

        store.clear().await.unwrap();
        assert!(store.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn invalid_form_is_rejected_without_store_call() {
        let clock = ManualClock::new(0);
        let (c, s) = collaborators(&clock);
        let store = MemoryJobStore::new(c.clone(), s.clone());

        let mut session = FormSession::new(c, s);
        session.apply(|f| f.set_field(FormField::JobName("Bad Name".into())));

        let outcome = session.submit(&store).await;
        assert!(matches!(outcome, SubmitOutcome::Rejected { ref errors } if errors.len() == 1));
        assert_eq!(outcome.message(), "Fix form errors and try again.");
        assert!(store.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn store_failure_still_creates() {
        let clock = ManualClock::new(0);
        let (c, s) = collaborators(&clock);
        let mut session = FormSession::new(c, s);
        session.apply(|f| f.set_field(FormField::JobName("train-a".into())));

        let outcome = session.submit(&BrokenStore).await;
        assert!(matches!(
            outcome,
            SubmitOutcome::Created {
                persisted: PersistOutcome::Failed,
                ..
            }
        ));
        assert!(outcome.message().contains("could not be saved"));
    }
}
