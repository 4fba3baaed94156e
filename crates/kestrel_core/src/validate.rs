use crate::constants::defaults::{MAX_PRIORITY, TRAIN_CHANNEL};
use crate::form::{AlgorithmSource, ChannelSource, TrainingJobForm};

use regex::Regex;
use std::sync::LazyLock;

pub const JOB_NAME_PATTERN: &str = "^[a-z0-9]([-a-z0-9]{0,61}[a-z0-9])?$";

static JOB_NAME: LazyLock<Result<Regex, regex::Error>> =
    LazyLock::new(|| Regex::new(JOB_NAME_PATTERN));

/// 1 to 63 characters of `[a-z0-9-]`, starting and ending alphanumeric.
pub fn is_valid_job_name(name: &str) -> bool {
    JOB_NAME.as_ref().is_ok_and(|re| re.is_match(name))
}

/// Every rule the draft breaks, in a stable order. An empty list means the form
/// can be submitted.
pub fn validate(form: &TrainingJobForm) -> Vec<String> {
    let mut errors = Vec::new();

    if !is_valid_job_name(&form.job_name) {
        errors.push(format!(
            "Job name is required and must match {JOB_NAME_PATTERN}"
        ));
    }

    if !form.priority.is_finite() || form.priority <= 0.0 || form.priority > MAX_PRIORITY {
        errors.push("Priority must be greater than 0 and at most 1000.".to_string());
    }

    let algorithm = &form.algorithm;
    match algorithm.source {
        AlgorithmSource::Builtin if is_blank(algorithm.algorithm_name.as_deref()) => {
            errors.push("Select a built-in algorithm.".to_string());
        }
        AlgorithmSource::Container if is_blank(algorithm.image_uri.as_deref()) => {
            errors.push("Container image URI is required.".to_string());
        }
        _ => {}
    }

    if form.input_data_config.is_empty() {
        errors.push("At least one input channel is required.".to_string());
    }
    if !form
        .input_data_config
        .iter()
        .any(|channel| channel.channel_name == TRAIN_CHANNEL)
    {
        errors.push("A 'train' channel is required.".to_string());
    }

    for (idx, channel) in form.input_data_config.iter().enumerate() {
        let position = idx + 1;
        if channel.channel_name.is_empty() {
            errors.push(format!("Channel #{position}: name is required."));
        }

        let label = if channel.channel_name.is_empty() {
            position.to_string()
        } else {
            channel.channel_name.clone()
        };

        match &channel.source {
            ChannelSource::ObjectStorage {
                provider,
                bucket,
                prefix,
                ..
            } => {
                if provider.is_none() {
                    errors.push(format!("Channel '{label}': provider is required."));
                }
                if bucket.is_empty() {
                    errors.push(format!("Channel '{label}': bucket/container is required."));
                }
                if prefix.is_empty() {
                    errors.push(format!("Channel '{label}': prefix/path is required."));
                }
            }
            ChannelSource::Upload { upload_file_name } => {
                if upload_file_name.is_empty() {
                    errors.push(format!("Channel '{label}': upload file is required."));
                }
            }
        }
    }

    if form.output_data_config.artifact_uri.is_empty() {
        errors.push("Output artifact URI is required.".to_string());
    }

    errors
}

fn is_blank(value: Option<&str>) -> bool {
    value.is_none_or(str::is_empty)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::{AlgorithmPatch, ChannelPatch, FormField, OutputDataConfig, SourceType};

    fn valid_form() -> TrainingJobForm {
        TrainingJobForm::new().set_field(FormField::JobName("train-abc123".into()))
    }

    #[test]
    fn job_name_boundaries() {
        assert!(is_valid_job_name("a"));
        assert!(is_valid_job_name("a-b"));
        assert!(is_valid_job_name(&"a".repeat(63)));

        assert!(!is_valid_job_name(""));
        assert!(!is_valid_job_name("-a"));
        assert!(!is_valid_job_name("a-"));
        assert!(!is_valid_job_name("A"));
        assert!(!is_valid_job_name("a_b"));
        assert!(!is_valid_job_name(&"a".repeat(64)));
    }

    #[test]
    fn default_form_is_valid() {
        assert_eq!(validate(&valid_form()), Vec::<String>::new());
    }

    #[test]
    fn collects_every_violation() {
        let form = valid_form();
        let train = form.input_data_config[0].id.clone();
        let form = form
            .set_field(FormField::JobName(String::new()))
            .update_channel(
                &train,
                ChannelPatch {
                    channel_name: Some("validation".into()),
                    ..Default::default()
                },
            );

        let errors = validate(&form);
        assert!(errors.iter().any(|e| e.starts_with("Job name is required")));
        assert!(errors.iter().any(|e| e == "A 'train' channel is required."));
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn priority_range() {
        for bad in [0.0, -1.0, 1000.5, f64::NAN, f64::INFINITY] {
            let mut form = valid_form();
            form.priority = bad;
            assert_eq!(
                validate(&form),
                vec!["Priority must be greater than 0 and at most 1000."]
            );
        }
        let form = valid_form().set_field(FormField::Priority(1000.0));
        assert!(validate(&form).is_empty());
    }

    #[test]
    fn container_requires_image() {
        let form = valid_form().update_algorithm(AlgorithmPatch {
            source: Some(crate::form::AlgorithmSource::Container),
            ..Default::default()
        });
        assert_eq!(validate(&form), vec!["Container image URI is required."]);
    }

    #[test]
    fn channel_rules_use_name_or_position() {
        let form = valid_form().add_channel(Some(ChannelPatch {
            bucket: Some(String::new()),
            prefix: Some(String::new()),
            ..Default::default()
        }));
        let form = form.add_channel(Some(ChannelPatch {
            channel_name: Some("extra".into()),
            source_type: Some(SourceType::Upload),
            ..Default::default()
        }));

        assert_eq!(
            validate(&form),
            vec![
                "Channel #2: name is required.",
                "Channel '2': bucket/container is required.",
                "Channel '2': prefix/path is required.",
                "Channel 'extra': upload file is required.",
            ]
        );
    }

    #[test]
    fn output_uri_is_required() {
        let form = valid_form().set_field(FormField::OutputDataConfig(OutputDataConfig {
            artifact_uri: String::new(),
        }));
        assert_eq!(validate(&form), vec!["Output artifact URI is required."]);
    }
}
