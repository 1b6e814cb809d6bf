pub mod artifact;
pub mod config;
pub mod fetcher;
pub mod format;
pub mod jobs;
pub mod metrics;
pub mod source;
pub mod testing;

pub use artifact::{
    remove_job_files, resolve, Artifact, ArtifactStore, CleanupPolicy, GarbageCollector,
    ResolvedFile, StoreStats, SweepReport,
};
pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, FetcherConfig,
    ServerConfig, StorageConfig,
};
pub use fetcher::{
    sanitize, ArgumentBuilder, DownloadRequest, FetchError, InvocationPlan, MediaInfo, MediaKind,
    ProcessExecutor, ProcessOutput, Quality, SearchHit, TokioProcessExecutor,
};
pub use jobs::{Job, JobFailure, JobId, JobReport, JobRunner, JobState};
pub use source::{normalize, NormalizedSource, SourceInput};
