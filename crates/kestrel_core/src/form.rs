//! The training-job draft and the named operations that edit it.
//!
//! Every updater takes the form by value and returns the next form, so a session
//! holds exactly one draft and no caller can leave it half-edited.

use crate::constants::defaults;
use crate::hyperparameters::{self, DEFAULT_ALGORITHM, HyperparameterValues};

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::Number;
use std::collections::{BTreeMap, HashSet};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum AlgorithmSource {
    #[default]
    Builtin,
    Container,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct AlgorithmChoice {
    pub source: AlgorithmSource,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub algorithm_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_uri: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct AlgorithmPatch {
    pub source: Option<AlgorithmSource>,
    pub algorithm_name: Option<String>,
    pub image_uri: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum StorageProvider {
    Aws,
    Minio,
    Gcs,
    Azure,
    Custom,
}

impl StorageProvider {
    pub const ALL: [StorageProvider; 5] = [
        StorageProvider::Aws,
        StorageProvider::Minio,
        StorageProvider::Gcs,
        StorageProvider::Azure,
        StorageProvider::Custom,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StorageProvider::Aws => "aws",
            StorageProvider::Minio => "minio",
            StorageProvider::Gcs => "gcs",
            StorageProvider::Azure => "azure",
            StorageProvider::Custom => "custom",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|provider| provider.as_str().eq_ignore_ascii_case(raw.trim()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceType {
    ObjectStorage,
    Upload,
}

/// Where a channel reads from. Fields that belong to the other source type
/// cannot exist, so switching type drops them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "sourceType", rename_all = "kebab-case")]
pub enum ChannelSource {
    ObjectStorage {
        #[serde(rename = "storageProvider", default, skip_serializing_if = "Option::is_none")]
        provider: Option<StorageProvider>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        endpoint: Option<String>,
        #[serde(default)]
        bucket: String,
        #[serde(default)]
        prefix: String,
    },
    Upload {
        #[serde(rename = "uploadFileName", default)]
        upload_file_name: String,
    },
}

impl ChannelSource {
    pub fn object_storage() -> Self {
        ChannelSource::ObjectStorage {
            provider: Some(StorageProvider::Minio),
            endpoint: Some(defaults::ENDPOINT.to_string()),
            bucket: defaults::BUCKET.to_string(),
            prefix: defaults::PREFIX.to_string(),
        }
    }

    pub fn source_type(&self) -> SourceType {
        match self {
            ChannelSource::ObjectStorage { .. } => SourceType::ObjectStorage,
            ChannelSource::Upload { .. } => SourceType::Upload,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Channel {
    pub id: String,
    pub channel_name: String,
    #[serde(flatten)]
    pub source: ChannelSource,
}

impl Channel {
    /// An object-storage channel with the default MinIO location.
    pub fn new(channel_name: impl Into<String>) -> Self {
        Self {
            id: new_channel_id(),
            channel_name: channel_name.into(),
            source: ChannelSource::object_storage(),
        }
    }

    /// Applies `patch`, flipping the source type first so the remaining fields
    /// land on the right variant. Fields for the other variant are ignored.
    pub fn patched(mut self, patch: ChannelPatch) -> Self {
        if let Some(name) = patch.channel_name {
            self.channel_name = name;
        }

        match (patch.source_type, self.source.source_type()) {
            (Some(SourceType::Upload), SourceType::ObjectStorage) => {
                self.source = ChannelSource::Upload {
                    upload_file_name: String::new(),
                };
            }
            (Some(SourceType::ObjectStorage), SourceType::Upload) => {
                self.source = ChannelSource::ObjectStorage {
                    provider: Some(StorageProvider::Minio),
                    endpoint: None,
                    bucket: String::new(),
                    prefix: String::new(),
                };
            }
            _ => {}
        }

        match &mut self.source {
            ChannelSource::ObjectStorage {
                provider,
                endpoint,
                bucket,
                prefix,
            } => {
                if let Some(next) = patch.provider {
                    *provider = Some(next);
                }
                if let Some(next) = patch.endpoint {
                    *endpoint = (!next.is_empty()).then_some(next);
                }
                if let Some(next) = patch.bucket {
                    *bucket = next;
                }
                if let Some(next) = patch.prefix {
                    *prefix = next;
                }
            }
            ChannelSource::Upload { upload_file_name } => {
                if let Some(next) = patch.upload_file_name {
                    *upload_file_name = next;
                }
            }
        }
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct ChannelPatch {
    pub channel_name: Option<String>,
    pub source_type: Option<SourceType>,
    pub provider: Option<StorageProvider>,
    pub endpoint: Option<String>,
    pub bucket: Option<String>,
    pub prefix: Option<String>,
    pub upload_file_name: Option<String>,
}

fn new_channel_id() -> String {
    Uuid::new_v4().to_string()
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InstanceResources {
    pub cpu_cores: u32,
    #[serde(rename = "memoryGiB")]
    pub memory_gib: u32,
    pub gpu_count: u32,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum DistributedStrategy {
    #[default]
    Mpi,
    Ps,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct DistributedConfig {
    pub enabled: bool,
    pub strategy: DistributedStrategy,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub world_size: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processes_per_host: Option<u32>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TrainingResources {
    pub instance_resources: InstanceResources,
    pub instance_count: u32,
    #[serde(rename = "volumeSizeGB")]
    pub volume_size_gb: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distributed: Option<DistributedConfig>,
}

impl Default for TrainingResources {
    fn default() -> Self {
        Self {
            instance_resources: InstanceResources {
                cpu_cores: defaults::CPU_CORES,
                memory_gib: defaults::MEMORY_GIB,
                gpu_count: defaults::GPU_COUNT,
            },
            instance_count: defaults::INSTANCE_COUNT,
            volume_size_gb: defaults::VOLUME_SIZE_GB,
            distributed: None,
        }
    }
}

/// Raw numeric edits to [`TrainingResources`].
///
/// Counts are floored and clamped to at least 1 (0 for GPUs). A non-finite
/// value keeps the previous count.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResourcesPatch {
    pub cpu_cores: Option<f64>,
    pub memory_gib: Option<f64>,
    pub gpu_count: Option<f64>,
    pub instance_count: Option<f64>,
    pub volume_size_gb: Option<f64>,
    pub distributed_enabled: Option<bool>,
    pub strategy: Option<DistributedStrategy>,
    pub world_size: Option<f64>,
    pub processes_per_host: Option<f64>,
}

impl TrainingResources {
    /// The same resources with every count raised to its minimum. Disabled
    /// distributed settings drop their sizes.
    pub fn normalized(mut self) -> Self {
        let instance = &mut self.instance_resources;
        instance.cpu_cores = instance.cpu_cores.max(1);
        instance.memory_gib = instance.memory_gib.max(1);
        self.instance_count = self.instance_count.max(1);
        self.volume_size_gb = self.volume_size_gb.max(1);

        if let Some(distributed) = &mut self.distributed {
            if distributed.enabled {
                distributed.world_size = distributed.world_size.map(|n| n.max(1));
                distributed.processes_per_host = distributed.processes_per_host.map(|n| n.max(1));
            } else {
                distributed.world_size = None;
                distributed.processes_per_host = None;
            }
        }
        self
    }
}

fn clamp_count(raw: f64, min: u32, previous: u32) -> u32 {
    if raw.is_finite() {
        raw.floor().max(f64::from(min)) as u32
    } else {
        previous
    }
}

fn optional_count(raw: f64) -> Option<u32> {
    raw.is_finite().then(|| raw.floor().max(1.0) as u32)
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StoppingCondition {
    pub max_runtime_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct OutputDataConfig {
    pub artifact_uri: String,
}

/// A free-form hyperparameter value for container jobs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum CustomValue {
    Bool(bool),
    Number(Number),
    Text(String),
}

pub type CustomHyperparameters = BTreeMap<String, CustomValue>;

/// The only place untyped text becomes a typed hyperparameter value.
///
/// Tries, in order: `true`/`false` (any case), a finite number, and falls back to
/// the text as given. This is a convenience guess, not a parser: `"1e3"` becomes
/// `1000` and `"007"` becomes `7`.
pub fn infer_custom_value(raw: &str) -> CustomValue {
    if raw.eq_ignore_ascii_case("true") {
        return CustomValue::Bool(true);
    }
    if raw.eq_ignore_ascii_case("false") {
        return CustomValue::Bool(false);
    }

    let trimmed = raw.trim();
    if !trimmed.is_empty()
        && let Ok(n) = trimmed.parse::<f64>()
        && n.is_finite()
    {
        let number = if n.fract() == 0.0 && n.abs() < i64::MAX as f64 {
            Some(Number::from(n as i64))
        } else {
            Number::from_f64(n)
        };
        if let Some(number) = number {
            return CustomValue::Number(number);
        }
    }

    CustomValue::Text(raw.to_string())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

/// Whole-field replacement for [`TrainingJobForm::set_field`].
#[derive(Debug, Clone)]
pub enum FormField {
    JobName(String),
    Priority(f64),
    Algorithm(AlgorithmChoice),
    Resources(TrainingResources),
    StoppingCondition(StoppingCondition),
    InputDataConfig(Vec<Channel>),
    OutputDataConfig(OutputDataConfig),
    Hyperparameters(BTreeMap<String, HyperparameterValues>),
    CustomHyperparameters(CustomHyperparameters),
}

/// One training-job draft.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TrainingJobForm {
    pub job_name: String,
    pub priority: f64,
    pub algorithm: AlgorithmChoice,
    pub resources: TrainingResources,
    pub stopping_condition: StoppingCondition,
    pub input_data_config: Vec<Channel>,
    pub output_data_config: OutputDataConfig,
    /// Values per algorithm id. Switching algorithms keeps the others intact.
    pub hyperparameters: BTreeMap<String, HyperparameterValues>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub custom_hyperparameters: CustomHyperparameters,
}

impl Default for TrainingJobForm {
    fn default() -> Self {
        Self::new()
    }
}

impl TrainingJobForm {
    /// A fresh draft with a generated name and the default algorithm seeded.
    pub fn new() -> Self {
        let mut hyperparameters = BTreeMap::new();
        hyperparameters.insert(
            DEFAULT_ALGORITHM.to_string(),
            hyperparameters::defaults(DEFAULT_ALGORITHM),
        );

        Self {
            job_name: generate_job_name(defaults::JOB_NAME_PREFIX, Utc::now()),
            priority: defaults::PRIORITY,
            algorithm: AlgorithmChoice {
                source: AlgorithmSource::Builtin,
                algorithm_name: Some(DEFAULT_ALGORITHM.to_string()),
                image_uri: None,
            },
            resources: TrainingResources::default(),
            stopping_condition: StoppingCondition {
                max_runtime_seconds: defaults::MAX_RUNTIME_SECONDS,
            },
            input_data_config: vec![Channel::new(defaults::TRAIN_CHANNEL)],
            output_data_config: OutputDataConfig {
                artifact_uri: defaults::ARTIFACT_URI.to_string(),
            },
            hyperparameters,
            custom_hyperparameters: CustomHyperparameters::new(),
        }
    }

    /// Replaces one field wholesale.
    ///
    /// The replacement goes through the same rules as the matching updater:
    /// priority and resource counts are clamped, the algorithm choice keeps only
    /// the fields of its source, and channel ids are made unique. An empty
    /// channel list is ignored.
    pub fn set_field(mut self, field: FormField) -> Self {
        match field {
            FormField::JobName(v) => self.job_name = v,
            FormField::Priority(v) => return self.set_priority(v),
            FormField::Algorithm(v) => {
                self.algorithm = AlgorithmChoice {
                    source: v.source,
                    ..Default::default()
                };
                return self.update_algorithm(AlgorithmPatch {
                    source: Some(v.source),
                    algorithm_name: v.algorithm_name,
                    image_uri: v.image_uri,
                });
            }
            FormField::Resources(v) => self.resources = v.normalized(),
            FormField::StoppingCondition(v) => self.stopping_condition = v,
            FormField::InputDataConfig(mut v) => {
                if !v.is_empty() {
                    let mut seen = HashSet::new();
                    for channel in &mut v {
                        if channel.id.is_empty() || !seen.insert(channel.id.clone()) {
                            channel.id = new_channel_id();
                            seen.insert(channel.id.clone());
                        }
                    }
                    self.input_data_config = v;
                }
            }
            FormField::OutputDataConfig(v) => self.output_data_config = v,
            FormField::Hyperparameters(v) => self.hyperparameters = v,
            FormField::CustomHyperparameters(v) => self.custom_hyperparameters = v,
        }
        self
    }

    /// Clamps to `[1, 1000]`. Non-finite input keeps the current priority.
    pub fn set_priority(mut self, raw: f64) -> Self {
        if raw.is_finite() {
            self.priority = raw.clamp(defaults::MIN_PRIORITY, defaults::MAX_PRIORITY);
        }
        self
    }

    pub fn max_runtime_hm(&self) -> (u64, u64) {
        let seconds = self.stopping_condition.max_runtime_seconds;
        (seconds / 3600, (seconds % 3600) / 60)
    }

    /// Derives the runtime limit from hours (≥ 0) and minutes (0..=59). A
    /// non-finite component keeps its current value.
    pub fn set_max_runtime(mut self, hours: f64, minutes: f64) -> Self {
        let (current_h, current_m) = self.max_runtime_hm();
        let h = if hours.is_finite() {
            hours.floor().max(0.0) as u64
        } else {
            current_h
        };
        let m = if minutes.is_finite() {
            minutes.floor().clamp(0.0, 59.0) as u64
        } else {
            current_m
        };
        self.stopping_condition.max_runtime_seconds = h.saturating_mul(3600).saturating_add(m * 60);
        self
    }

    pub fn update_algorithm(mut self, patch: AlgorithmPatch) -> Self {
        if let Some(source) = patch.source {
            self.algorithm.source = source;
        }
        if let Some(name) = patch.algorithm_name {
            self.algorithm.algorithm_name = Some(name);
        }
        if let Some(uri) = patch.image_uri {
            self.algorithm.image_uri = Some(uri);
        }

        match self.algorithm.source {
            AlgorithmSource::Builtin => {
                let resolved = self
                    .algorithm
                    .algorithm_name
                    .take()
                    .filter(|name| !name.is_empty())
                    .unwrap_or_else(|| DEFAULT_ALGORITHM.to_string());
                self.hyperparameters
                    .entry(resolved.clone())
                    .or_insert_with(|| hyperparameters::defaults(&resolved));
                self.algorithm.algorithm_name = Some(resolved);
                self.algorithm.image_uri = None;
            }
            AlgorithmSource::Container => {
                self.algorithm.algorithm_name = None;
            }
        }
        self
    }

    pub fn update_resources(mut self, patch: ResourcesPatch) -> Self {
        let current = self.resources;
        let instance = &mut self.resources.instance_resources;

        if let Some(v) = patch.cpu_cores {
            instance.cpu_cores = clamp_count(v, 1, current.instance_resources.cpu_cores);
        }
        if let Some(v) = patch.memory_gib {
            instance.memory_gib = clamp_count(v, 1, current.instance_resources.memory_gib);
        }
        if let Some(v) = patch.gpu_count {
            instance.gpu_count = clamp_count(v, 0, current.instance_resources.gpu_count);
        }
        if let Some(v) = patch.instance_count {
            self.resources.instance_count = clamp_count(v, 1, current.instance_count);
        }
        if let Some(v) = patch.volume_size_gb {
            self.resources.volume_size_gb = clamp_count(v, 1, current.volume_size_gb);
        }

        let touches_distributed = patch.distributed_enabled.is_some()
            || patch.strategy.is_some()
            || patch.world_size.is_some()
            || patch.processes_per_host.is_some();
        if touches_distributed {
            let mut distributed = self.resources.distributed.unwrap_or_default();
            if let Some(enabled) = patch.distributed_enabled {
                distributed.enabled = enabled;
            }
            if let Some(strategy) = patch.strategy {
                distributed.strategy = strategy;
            }
            if let Some(v) = patch.world_size {
                distributed.world_size = optional_count(v);
            }
            if let Some(v) = patch.processes_per_host {
                distributed.processes_per_host = optional_count(v);
            }
            if !distributed.enabled {
                distributed.world_size = None;
                distributed.processes_per_host = None;
            }
            self.resources.distributed = Some(distributed);
        }
        self
    }

    /// Replaces the stored values of one algorithm. Other algorithms are untouched.
    pub fn update_hyperparameters(mut self, algorithm_id: &str, values: HyperparameterValues) -> Self {
        self.hyperparameters.insert(algorithm_id.to_string(), values);
        self
    }

    pub fn reset_hyperparameters(self, algorithm_id: &str) -> Self {
        let defaults = hyperparameters::defaults(algorithm_id);
        self.update_hyperparameters(algorithm_id, defaults)
    }

    /// The builtin algorithm being edited, or `None` for container jobs.
    pub fn active_algorithm_id(&self) -> Option<&str> {
        match self.algorithm.source {
            AlgorithmSource::Builtin => Some(
                self.algorithm
                    .algorithm_name
                    .as_deref()
                    .filter(|name| !name.is_empty())
                    .unwrap_or(DEFAULT_ALGORITHM),
            ),
            AlgorithmSource::Container => None,
        }
    }

    /// Stored values for the active algorithm, or its fresh defaults.
    pub fn active_hyperparameters(&self) -> Option<HyperparameterValues> {
        let id = self.active_algorithm_id()?;
        Some(
            self.hyperparameters
                .get(id)
                .cloned()
                .unwrap_or_else(|| hyperparameters::defaults(id)),
        )
    }

    pub fn set_custom_hyperparameter(mut self, key: &str, raw: &str) -> Self {
        let key = key.trim();
        if !key.is_empty() {
            self.custom_hyperparameters
                .insert(key.to_string(), infer_custom_value(raw));
        }
        self
    }

    pub fn remove_custom_hyperparameter(mut self, key: &str) -> Self {
        self.custom_hyperparameters.remove(key);
        self
    }

    pub fn reset_custom_hyperparameters(mut self) -> Self {
        self.custom_hyperparameters.clear();
        self
    }

    /// Appends a channel built from `template` over the default object-storage channel.
    pub fn add_channel(mut self, template: Option<ChannelPatch>) -> Self {
        let channel = Channel::new("").patched(template.unwrap_or_default());
        self.input_data_config.push(channel);
        self
    }

    /// Removes a channel unless it is the last one.
    pub fn remove_channel(mut self, id: &str) -> Self {
        if self.input_data_config.len() > 1
            && let Some(idx) = self.input_data_config.iter().position(|c| c.id == id)
        {
            self.input_data_config.remove(idx);
        }
        self
    }

    /// Appends a copy with a fresh id and `-copy` appended to the name.
    pub fn duplicate_channel(mut self, id: &str) -> Self {
        if let Some(source) = self.input_data_config.iter().find(|c| c.id == id) {
            let copy = Channel {
                id: new_channel_id(),
                channel_name: format!("{}-copy", source.channel_name),
                source: source.source.clone(),
            };
            self.input_data_config.push(copy);
        }
        self
    }

    /// Swaps a channel with its neighbour. No-op at either end or for an unknown id.
    pub fn move_channel(mut self, id: &str, direction: Direction) -> Self {
        let Some(idx) = self.input_data_config.iter().position(|c| c.id == id) else {
            return self;
        };
        let target = match direction {
            Direction::Up => idx.checked_sub(1),
            Direction::Down => Some(idx + 1).filter(|j| *j < self.input_data_config.len()),
        };
        if let Some(j) = target {
            self.input_data_config.swap(idx, j);
        }
        self
    }

    pub fn update_channel(mut self, id: &str, patch: ChannelPatch) -> Self {
        if let Some(channel) = self.input_data_config.iter_mut().find(|c| c.id == id) {
            *channel = channel.clone().patched(patch);
        }
        self
    }
}

const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// `<prefix>-<yyyymmddhhmmss>-<4 random base36 chars>`, always a valid job name
/// for a lowercase alphanumeric prefix.
pub fn generate_job_name(prefix: &str, now: DateTime<Utc>) -> String {
    let mut rng = rand::rng();
    let suffix: String = (0..4)
        .map(|_| BASE36[rng.random_range(0..BASE36.len())] as char)
        .collect();
    format!("{prefix}-{}-{suffix}", now.format("%Y%m%d%H%M%S"))
}
