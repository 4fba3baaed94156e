//! `kestrel submit` flags and how they map onto the form updaters.

use anyhow::{Context, bail};
use clap::{Args, ValueEnum};
use kestrel_core::hyperparameters;
use kestrel_core::prelude::*;

#[derive(Args, Debug)]
pub struct SubmitArgs {
    /// Job name. Generated (`train-<stamp>-<suffix>`) when omitted
    #[arg(long)]
    pub name: Option<String>,

    /// Scheduling priority, clamped to 1..=1000
    #[arg(long)]
    pub priority: Option<f64>,

    /// Built-in algorithm id (see `kestrel algorithms`)
    #[arg(long, conflicts_with = "image")]
    pub algorithm: Option<String>,

    /// Container image URI. Switches the job to a custom container
    #[arg(long)]
    pub image: Option<String>,

    /// Input channel, e.g. `name=train,provider=aws,bucket=s3://data,prefix=v1/`
    /// or `name=eval,upload=eval.csv`. Repeat for more channels; replaces the
    /// default `train` channel
    #[arg(long = "channel", value_name = "CHANNEL", value_parser = parse_channel)]
    pub channels: Vec<Channel>,

    /// Artifact output URI
    #[arg(long)]
    pub output: Option<String>,

    /// Hyperparameter of the built-in algorithm. Multi-select values are comma separated
    #[arg(long = "hp", value_name = "KEY=VALUE", value_parser = parse_key_value)]
    pub hyperparameters: Vec<(String, String)>,

    /// Free-form hyperparameter, typed by guess (bool, number, text)
    #[arg(long = "custom", value_name = "KEY=VALUE", value_parser = parse_key_value)]
    pub custom: Vec<(String, String)>,

    /// Maximum runtime, hours part
    #[arg(long)]
    pub hours: Option<f64>,

    /// Maximum runtime, minutes part (0..=59)
    #[arg(long)]
    pub minutes: Option<f64>,

    #[arg(long)]
    pub cpu: Option<f64>,

    /// Memory per instance in GiB
    #[arg(long)]
    pub memory: Option<f64>,

    #[arg(long)]
    pub gpus: Option<f64>,

    #[arg(long)]
    pub instances: Option<f64>,

    /// Volume size per instance in GB
    #[arg(long)]
    pub volume: Option<f64>,

    /// Enable distributed training
    #[arg(long)]
    pub distributed: bool,

    #[arg(long, value_enum, requires = "distributed")]
    pub strategy: Option<StrategyArg>,

    #[arg(long, requires = "distributed")]
    pub world_size: Option<f64>,

    #[arg(long, requires = "distributed")]
    pub processes_per_host: Option<f64>,

    /// Print the payload and any validation errors without storing anything
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum StrategyArg {
    Mpi,
    Ps,
}

impl From<StrategyArg> for DistributedStrategy {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::Mpi => DistributedStrategy::Mpi,
            StrategyArg::Ps => DistributedStrategy::Ps,
        }
    }
}

impl SubmitArgs {
    /// Runs every flag through its updater, in form order.
    ///
    /// Only flags that cannot be expressed as a form edit fail here (unknown
    /// algorithm or hyperparameter). Everything else is left to the validator.
    pub fn build(&self, mut form: TrainingJobForm) -> anyhow::Result<TrainingJobForm> {
        if let Some(name) = &self.name {
            form = form.set_field(FormField::JobName(name.clone()));
        }
        if let Some(priority) = self.priority {
            form = form.set_priority(priority);
        }

        if let Some(id) = &self.algorithm {
            if hyperparameters::display_name(id).is_none() {
                bail!("Unknown algorithm `{id}`. Run `kestrel algorithms` to list them.");
            }
            form = form.update_algorithm(AlgorithmPatch {
                source: Some(AlgorithmSource::Builtin),
                algorithm_name: Some(id.clone()),
                image_uri: None,
            });
        }
        if let Some(image) = &self.image {
            form = form.update_algorithm(AlgorithmPatch {
                source: Some(AlgorithmSource::Container),
                algorithm_name: None,
                image_uri: Some(image.clone()),
            });
        }

        form = self.apply_hyperparameters(form)?;
        for (key, raw) in &self.custom {
            form = form.set_custom_hyperparameter(key, raw);
        }

        if !self.channels.is_empty() {
            form = form.set_field(FormField::InputDataConfig(self.channels.clone()));
        }
        if let Some(uri) = &self.output {
            form = form.set_field(FormField::OutputDataConfig(OutputDataConfig {
                artifact_uri: uri.clone(),
            }));
        }

        if self.hours.is_some() || self.minutes.is_some() {
            let (h, m) = form.max_runtime_hm();
            form = form.set_max_runtime(
                self.hours.unwrap_or(h as f64),
                self.minutes.unwrap_or(m as f64),
            );
        }

        Ok(form.update_resources(ResourcesPatch {
            cpu_cores: self.cpu,
            memory_gib: self.memory,
            gpu_count: self.gpus,
            instance_count: self.instances,
            volume_size_gb: self.volume,
            distributed_enabled: self.distributed.then_some(true),
            strategy: self.strategy.map(Into::into),
            world_size: self.world_size,
            processes_per_host: self.processes_per_host,
        }))
    }

    fn apply_hyperparameters(&self, form: TrainingJobForm) -> anyhow::Result<TrainingJobForm> {
        if self.hyperparameters.is_empty() {
            return Ok(form);
        }

        let Some(id) = form.active_algorithm_id().map(str::to_string) else {
            bail!("--hp only applies to built-in algorithms, use --custom for container images");
        };
        let config = hyperparameters::config_or_placeholder(&id);
        if config.is_read_only() {
            bail!("{} has no editable hyperparameters", config.label);
        }

        let mut values = form.active_hyperparameters().unwrap_or_default();
        for (key, raw) in &self.hyperparameters {
            values = config
                .apply(&values, key, raw)
                .with_context(|| format!("{} has no hyperparameter `{key}`", config.label))?;
        }
        Ok(form.update_hyperparameters(&id, values))
    }
}

pub fn parse_key_value(raw: &str) -> Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got `{raw}`"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("missing key in `{raw}`"));
    }
    Ok((key.to_string(), value.to_string()))
}

/// Parses a `--channel` value into a new channel.
///
/// Object-storage fields that are not given keep the channel defaults. `upload=`
/// turns the channel into an upload channel.
pub fn parse_channel(raw: &str) -> anyhow::Result<Channel> {
    let mut name = String::new();
    let mut patch = ChannelPatch::default();

    for part in raw.split(',').map(str::trim).filter(|part| !part.is_empty()) {
        let (key, value) = parse_key_value(part).map_err(anyhow::Error::msg)?;
        let value = value.trim().to_string();
        match key.as_str() {
            "name" => name = value,
            "provider" => {
                let provider = StorageProvider::parse(&value)
                    .with_context(|| format!("Unknown storage provider `{value}`"))?;
                patch.provider = Some(provider);
            }
            "endpoint" => patch.endpoint = Some(value),
            "bucket" => patch.bucket = Some(value),
            "prefix" => patch.prefix = Some(value),
            "upload" => {
                patch.source_type = Some(SourceType::Upload);
                patch.upload_file_name = Some(value);
            }
            other => bail!("Unknown channel key `{other}`"),
        }
    }

    Ok(Channel::new(name).patched(patch))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct Cli {
        #[command(flatten)]
        submit: SubmitArgs,
    }

    fn build(args: &[&str]) -> anyhow::Result<TrainingJobForm> {
        let cli = Cli::try_parse_from(std::iter::once("submit").chain(args.iter().copied()))?;
        cli.submit.build(TrainingJobForm::new())
    }

    #[test]
    fn no_flags_keeps_the_defaults() {
        let form = build(&[]).unwrap();
        assert!(validate(&form).is_empty());
        assert_eq!(form.active_algorithm_id(), Some("xgboost"));
        assert_eq!(form.input_data_config.len(), 1);
    }

    #[test]
    fn flags_map_onto_updaters() {
        let form = build(&[
            "--name",
            "train-abc123",
            "--priority",
            "5000",
            "--algorithm",
            "lightgbm",
            "--hp",
            "num_leaves=1",
            "--hours",
            "2",
            "--minutes",
            "75",
            "--gpus",
            "-3",
            "--distributed",
            "--strategy",
            "ps",
            "--world-size",
            "4",
        ])
        .unwrap();

        assert_eq!(form.job_name, "train-abc123");
        assert_eq!(form.priority, 1000.0);
        assert_eq!(form.active_algorithm_id(), Some("lightgbm"));
        assert_eq!(form.stopping_condition.max_runtime_seconds, 2 * 3600 + 59 * 60);
        assert_eq!(form.resources.instance_resources.gpu_count, 0);

        let distributed = form.resources.distributed.unwrap();
        assert!(distributed.enabled);
        assert_eq!(distributed.strategy, DistributedStrategy::Ps);
        assert_eq!(distributed.world_size, Some(4));

        let values = form.active_hyperparameters().unwrap();
        let config = hyperparameters::get("lightgbm").unwrap();
        assert_eq!(values, config.apply(&config.defaults(), "num_leaves", "1").unwrap());
    }

    #[test]
    fn channels_replace_the_default() {
        let form = build(&[
            "--channel",
            "name=train,provider=aws,bucket=s3://data,prefix=v1/",
            "--channel",
            "name=eval,upload=eval.csv",
        ])
        .unwrap();

        assert_eq!(form.input_data_config.len(), 2);
        match &form.input_data_config[0].source {
            ChannelSource::ObjectStorage {
                provider,
                bucket,
                prefix,
                ..
            } => {
                assert_eq!(*provider, Some(StorageProvider::Aws));
                assert_eq!(bucket, "s3://data");
                assert_eq!(prefix, "v1/");
            }
            other => panic!("unexpected source {other:?}"),
        }
        assert_eq!(
            form.input_data_config[1].source,
            ChannelSource::Upload {
                upload_file_name: "eval.csv".into()
            }
        );
        assert!(validate(&form).is_empty());
    }

    #[test]
    fn container_jobs_take_custom_values() {
        let form = build(&[
            "--image",
            "registry.local/train:1",
            "--custom",
            "epochs=10",
            "--custom",
            "shuffle=TRUE",
        ])
        .unwrap();

        assert_eq!(form.algorithm.source, AlgorithmSource::Container);
        assert_eq!(form.active_algorithm_id(), None);
        assert_eq!(form.custom_hyperparameters["epochs"], CustomValue::Number(10.into()));
        assert_eq!(form.custom_hyperparameters["shuffle"], CustomValue::Bool(true));
    }

    #[test]
    fn rejects_what_the_form_cannot_express() {
        assert!(build(&["--algorithm", "nope"]).is_err());
        assert!(build(&["--hp", "not_a_field=1"]).is_err());
        assert!(build(&["--algorithm", "jax-pjit", "--hp", "eta=1"]).is_err());
        assert!(build(&["--image", "img", "--hp", "eta=1"]).is_err());
        assert!(build(&["--algorithm", "xgboost", "--image", "img"]).is_err());
        assert!(build(&["--world-size", "2"]).is_err());
        assert!(build(&["--channel", "name=train,provider=dropbox"]).is_err());
    }

    #[test]
    fn missing_channel_name_is_left_to_the_validator() {
        let form = build(&["--channel", "bucket=s3://x"]).unwrap();
        let errors = validate(&form);
        assert!(errors.contains(&"Channel #1: name is required.".to_string()));
        assert!(errors.contains(&"A 'train' channel is required.".to_string()));
    }

    #[test]
    fn key_value_parsing() {
        assert_eq!(parse_key_value("a=b=c"), Ok(("a".into(), "b=c".into())));
        assert!(parse_key_value("novalue").is_err());
        assert!(parse_key_value("=x").is_err());
    }
}
