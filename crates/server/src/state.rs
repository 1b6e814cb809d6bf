use std::sync::Arc;
use tubefetch_core::{ArtifactStore, Config, GarbageCollector, JobRunner};

/// Shared application state
pub struct AppState {
    config: Config,
    runner: Arc<JobRunner>,
    gc: Arc<GarbageCollector>,
}

impl AppState {
    pub fn new(config: Config, runner: Arc<JobRunner>, gc: Arc<GarbageCollector>) -> Self {
        Self { config, runner, gc }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn runner(&self) -> &JobRunner {
        self.runner.as_ref()
    }

    pub fn store(&self) -> &ArtifactStore {
        self.runner.store().as_ref()
    }

    pub fn gc(&self) -> &GarbageCollector {
        self.gc.as_ref()
    }

    /// Builds a retrieval link, absolute when a public base URL is configured.
    pub fn link(&self, route: &str, filename: &str) -> String {
        let base = self
            .config
            .server
            .public_base_url
            .as_deref()
            .unwrap_or("")
            .trim_end_matches('/');
        format!("{}/{}/{}", base, route, filename)
    }
}
