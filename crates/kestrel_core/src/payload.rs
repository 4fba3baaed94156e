use crate::form::{
    AlgorithmChoice, AlgorithmSource, Channel, CustomHyperparameters, OutputDataConfig, StoppingCondition,
    TrainingJobForm, TrainingResources,
};
use crate::hyperparameters::{self, HyperparameterValues};
use crate::job::StoredJob;
use crate::status::StatusSource;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The submission record written next to the job summary.
///
/// Owns all of its data: editing the draft afterwards never changes a payload
/// and vice versa.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct JobPayload {
    pub job_name: String,
    pub priority: f64,
    pub algorithm: AlgorithmChoice,
    pub resources: TrainingResources,
    pub stopping_condition: StoppingCondition,
    pub input_data_config: Vec<Channel>,
    pub output_data_config: OutputDataConfig,
    pub hyperparameters: BTreeMap<String, HyperparameterValues>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub custom_hyperparameters: CustomHyperparameters,
}

pub fn to_payload(form: &TrainingJobForm) -> JobPayload {
    JobPayload {
        job_name: form.job_name.clone(),
        priority: form.priority,
        algorithm: form.algorithm.clone(),
        resources: form.resources,
        stopping_condition: form.stopping_condition,
        input_data_config: form.input_data_config.clone(),
        output_data_config: form.output_data_config.clone(),
        hyperparameters: form.hyperparameters.clone(),
        custom_hyperparameters: form.custom_hyperparameters.clone(),
    }
}

/// Label shown in the job list for the algorithm of `form`.
pub fn algorithm_label(algorithm: &AlgorithmChoice) -> String {
    match algorithm.source {
        AlgorithmSource::Builtin => algorithm
            .algorithm_name
            .as_deref()
            .and_then(hyperparameters::display_name)
            .unwrap_or("Built-in")
            .to_string(),
        AlgorithmSource::Container => algorithm
            .image_uri
            .clone()
            .filter(|uri| !uri.is_empty())
            .unwrap_or_else(|| "Custom Container".to_string()),
    }
}

impl StoredJob {
    /// The summary record for a submission of `form` at `now_ms`.
    pub fn for_submission(form: &TrainingJobForm, now_ms: i64, status: &dyn StatusSource) -> Self {
        let (status, pending_until) = status.initial(now_ms);
        Self {
            id: form.job_name.clone(),
            algorithm: algorithm_label(&form.algorithm),
            created_at: now_ms,
            priority: form.priority,
            status,
            pending_until,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::{AlgorithmPatch, ChannelPatch, FormField};
    use crate::job::JobStatus;
    use crate::status::SimulatedDelay;
    use serde_json::json;

    fn form() -> TrainingJobForm {
        TrainingJobForm::new().set_field(FormField::JobName("train-abc123".into()))
    }

    #[test]
    fn payload_is_independent_of_form() {
        let form = form();
        let mut payload = to_payload(&form);
        assert_eq!(serde_json::to_value(&payload).unwrap(), serde_json::to_value(&form).unwrap());

        payload.input_data_config[0].channel_name = "changed".into();
        payload
            .hyperparameters
            .get_mut("xgboost")
            .unwrap()
            .insert("eta".into(), json!(0.9));
        assert_eq!(form.input_data_config[0].channel_name, "train");
        assert_eq!(form.hyperparameters["xgboost"]["eta"], json!(0.3));

        let id = form.input_data_config[0].id.clone();
        let payload = to_payload(&form);
        let form = form.update_channel(
            &id,
            ChannelPatch {
                bucket: Some("other".into()),
                ..Default::default()
            },
        );
        assert_ne!(payload.input_data_config, form.input_data_config);
    }

    #[test]
    fn payload_json_shape() {
        let value = serde_json::to_value(to_payload(&form())).unwrap();
        assert_eq!(value["jobName"], json!("train-abc123"));
        assert_eq!(value["resources"]["instanceResources"]["memoryGiB"], json!(16));
        assert_eq!(value["resources"]["volumeSizeGB"], json!(50));
        assert!(value["resources"].get("distributed").is_none());
        assert_eq!(value["stoppingCondition"]["maxRuntimeSeconds"], json!(14400));
        assert_eq!(value["inputDataConfig"][0]["sourceType"], json!("object-storage"));
        assert_eq!(value["inputDataConfig"][0]["storageProvider"], json!("minio"));
        assert_eq!(value["outputDataConfig"]["artifactUri"], json!("storage://output/artifacts/"));
        assert_eq!(value["algorithm"], json!({"source": "builtin", "algorithmName": "xgboost"}));
        assert!(value.get("customHyperparameters").is_none());

        let early = &value["hyperparameters"]["xgboost"]["early_stopping_rounds"];
        assert!(early.is_null());
        assert!(value["hyperparameters"]["xgboost"].get("early_stopping_rounds").is_some());
        assert_eq!(value["hyperparameters"]["xgboost"]["eval_metric"], json!(["rmse"]));
    }

    #[test]
    fn stored_job_labels() {
        let source = SimulatedDelay::default();
        let job = StoredJob::for_submission(&form(), 1_000, &source);
        assert_eq!(job.id, "train-abc123");
        assert_eq!(job.algorithm, "XGBoost");
        assert_eq!(job.status, JobStatus::Pending);
        assert_eq!(job.pending_until, Some(16_000));

        let unknown = form().update_algorithm(AlgorithmPatch {
            algorithm_name: Some("catboost".into()),
            ..Default::default()
        });
        assert_eq!(StoredJob::for_submission(&unknown, 0, &source).algorithm, "Built-in");

        let container = form().update_algorithm(AlgorithmPatch {
            source: Some(AlgorithmSource::Container),
            ..Default::default()
        });
        assert_eq!(
            StoredJob::for_submission(&container, 0, &source).algorithm,
            "Custom Container"
        );
        let container = container.update_algorithm(AlgorithmPatch {
            image_uri: Some("registry.local/train:2".into()),
            ..Default::default()
        });
        assert_eq!(
            StoredJob::for_submission(&container, 0, &source).algorithm,
            "registry.local/train:2"
        );
    }
}
