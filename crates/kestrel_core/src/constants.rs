pub mod routes {
    pub const HEALTH: &str = "/health";

    pub const JOBS: &str = "/api/jobs";
}

pub mod keys {
    /// Root under which the key-value layout lives.
    pub const ROOT: &str = "training-job-ui/";

    pub const INDEX: &str = "training-job-ui/index.json";

    /// Prefix for payload blobs, followed by the payload filename.
    pub const PAYLOAD_PREFIX: &str = "training-job-ui/payloads/";
}

pub mod defaults {
    /// Directory used by the file system store when nothing else is configured.
    pub const DATA_DIR: &str = "tmp/jobs";

    pub const INDEX_FILE: &str = "index.json";

    /// How long a freshly submitted job stays `Pending` in the simulated status source.
    pub const PENDING_DELAY_MS: i64 = 15_000;

    pub const POLL_INTERVAL_MS: u64 = 5_000;

    pub const TICK_INTERVAL_MS: u64 = 1_000;

    pub const PRIORITY: f64 = 500.0;
    pub const MIN_PRIORITY: f64 = 1.0;
    pub const MAX_PRIORITY: f64 = 1000.0;

    pub const CPU_CORES: u32 = 4;
    pub const MEMORY_GIB: u32 = 16;
    pub const GPU_COUNT: u32 = 0;
    pub const INSTANCE_COUNT: u32 = 1;
    pub const VOLUME_SIZE_GB: u32 = 50;

    pub const MAX_RUNTIME_SECONDS: u64 = 4 * 3600;

    pub const ENDPOINT: &str = "https://minio.local";
    pub const BUCKET: &str = "storage://input";
    pub const PREFIX: &str = "datasets/default/";
    pub const ARTIFACT_URI: &str = "storage://output/artifacts/";

    pub const TRAIN_CHANNEL: &str = "train";
    pub const JOB_NAME_PREFIX: &str = "train";
}
