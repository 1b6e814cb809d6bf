//! Job runner: admission, execution, resolution and cleanup.

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{Semaphore, SemaphorePermit};
use tracing::{debug, error, info, warn};

use super::types::{Job, JobFailure, JobReport, JobState};
use crate::artifact::{self, ArtifactStore, ResolvedFile};
use crate::config::Config;
use crate::fetcher::{
    parse_info_output, parse_search_output, ArgumentBuilder, DownloadRequest, FetchError,
    InvocationPlan, MediaInfo, ProcessExecutor, ProcessOutput, SearchHit,
};
use crate::metrics;

/// Holds an admission permit and keeps the active counters in sync.
struct Admitted<'a> {
    _permit: SemaphorePermit<'a>,
    active: &'a AtomicUsize,
}

impl Drop for Admitted<'_> {
    fn drop(&mut self) {
        self.active.fetch_sub(1, Ordering::SeqCst);
        metrics::JOBS_ACTIVE.dec();
    }
}

/// Runs download jobs and lookups against the external tool.
///
/// Every tool invocation, including searches and metadata lookups, goes
/// through one admission semaphore sized by `fetcher.max_concurrent_jobs`.
/// Waiting for a permit only suspends the calling task.
pub struct JobRunner {
    binary: PathBuf,
    builder: ArgumentBuilder,
    executor: Arc<dyn ProcessExecutor>,
    store: Arc<ArtifactStore>,
    admission: Semaphore,
    max_concurrent: usize,
    active: AtomicUsize,
    size_warning_bytes: u64,
}

impl JobRunner {
    pub fn new(
        config: &Config,
        executor: Arc<dyn ProcessExecutor>,
        store: Arc<ArtifactStore>,
    ) -> Self {
        let max_concurrent = config.fetcher.max_concurrent_jobs.max(1);
        info!(
            executor = executor.name(),
            max_concurrent, "Job runner initialized"
        );

        Self {
            binary: config.fetcher.binary.clone(),
            builder: ArgumentBuilder::new(config.fetcher.clone()),
            executor,
            store,
            admission: Semaphore::new(max_concurrent),
            max_concurrent,
            active: AtomicUsize::new(0),
            size_warning_bytes: config.storage.size_warning_bytes(),
        }
    }

    pub fn store(&self) -> &Arc<ArtifactStore> {
        &self.store
    }

    /// Tool invocations currently holding a permit.
    pub fn active_jobs(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }

    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent
    }

    async fn admit(&self) -> Result<Admitted<'_>, FetchError> {
        metrics::JOBS_WAITING.inc();
        let permit = self.admission.acquire().await;
        metrics::JOBS_WAITING.dec();

        let permit = permit.map_err(|_| FetchError::SpawnError {
            program: self.binary.clone(),
            reason: "job admission is closed".to_string(),
        })?;

        self.active.fetch_add(1, Ordering::SeqCst);
        metrics::JOBS_ACTIVE.inc();
        Ok(Admitted {
            _permit: permit,
            active: &self.active,
        })
    }

    async fn run_admitted(&self, plan: &InvocationPlan) -> Result<ProcessOutput, FetchError> {
        let _admitted = self.admit().await?;
        self.executor.run(plan).await
    }

    fn advance(job: &mut Job, next: JobState) {
        if let Err(e) = job.transition(next) {
            error!(job_id = %job.id, "{}", e);
        }
    }

    /// Waits for admission, then runs the plan. The job stays `Pending`
    /// while queued.
    async fn execute(
        &self,
        job: &mut Job,
        plan: &InvocationPlan,
    ) -> Result<ResolvedFile, FetchError> {
        let output = {
            let _admitted = self.admit().await?;
            Self::advance(job, JobState::Running);
            self.executor.run(plan).await?
        };
        debug!(
            job_id = %job.id,
            elapsed_ms = output.elapsed.as_millis() as u64,
            stderr = %output.stderr.trim(),
            "Downloader exited cleanly"
        );
        artifact::resolve(self.store.dir(), &job.id).await
    }

    /// Runs one download job to completion.
    ///
    /// On success the artifact is registered in the store. On any failure
    /// files carrying the job id prefix are deleted before returning.
    pub async fn download(&self, request: DownloadRequest) -> Result<JobReport, JobFailure> {
        let start = Instant::now();
        let mut job = Job::new(request);

        let plan = match self
            .builder
            .download_plan(&job.id, &job.request, self.store.dir())
        {
            Ok(plan) => plan,
            Err(e) => {
                Self::advance(&mut job, JobState::Failed);
                return Err(self.fail(job, e, start).await);
            }
        };
        job.invocation_args = plan.args.clone();

        info!(
            job_id = %job.id,
            source = %job.request.source(),
            kind = job.request.kind().as_str(),
            quality = %job.request.quality(),
            "Job accepted"
        );

        let resolved = match self.execute(&mut job, &plan).await {
            Ok(resolved) => resolved,
            Err(e) => {
                Self::advance(&mut job, JobState::Failed);
                return Err(self.fail(job, e, start).await);
            }
        };

        let artifact = self.store.register(resolved).await;
        Self::advance(&mut job, JobState::Succeeded);

        let elapsed = start.elapsed();
        let oversized = artifact.size_bytes > self.size_warning_bytes;

        metrics::JOBS_TOTAL.with_label_values(&["success"]).inc();
        metrics::JOB_DURATION
            .with_label_values(&["success"])
            .observe(elapsed.as_secs_f64());
        metrics::ARTIFACT_SIZE
            .with_label_values(&[job.request.kind().as_str()])
            .observe(artifact.size_bytes as f64);

        info!(
            job_id = %job.id,
            file = %artifact.filename,
            size_bytes = artifact.size_bytes,
            elapsed_ms = elapsed.as_millis() as u64,
            oversized,
            "Job succeeded"
        );

        Ok(JobReport {
            job,
            artifact,
            elapsed,
            oversized,
        })
    }

    async fn fail(&self, job: Job, error: FetchError, start: Instant) -> JobFailure {
        let removed = artifact::remove_job_files(self.store.dir(), &job.id).await;
        let elapsed = start.elapsed();

        let result = error.kind();
        metrics::JOBS_TOTAL.with_label_values(&[result]).inc();
        metrics::JOB_DURATION
            .with_label_values(&[result])
            .observe(elapsed.as_secs_f64());

        match &error {
            FetchError::SpawnError { .. } | FetchError::Io(_) => {
                error!(job_id = %job.id, removed_files = removed, "Job failed: {}", error)
            }
            FetchError::InvalidRequest { .. } => {
                info!(job_id = %job.id, "Job rejected: {}", error)
            }
            _ => warn!(job_id = %job.id, removed_files = removed, "Job failed: {}", error),
        }

        JobFailure {
            job_id: Some(job.id),
            error,
        }
    }

    /// Searches for media and returns formatted hits.
    pub async fn search(&self, query: &str, limit: u32) -> Result<Vec<SearchHit>, FetchError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(FetchError::invalid_request("search query is required"));
        }

        let plan = self.builder.search_plan(query, limit)?;
        let result = self.run_admitted(&plan).await;
        let output = Self::record_lookup("search", result)?;

        let hits = parse_search_output(&output.stdout);
        metrics::SEARCH_RESULTS.observe(hits.len() as f64);
        debug!(query, results = hits.len(), "Search finished");
        Ok(hits)
    }

    /// Fetches metadata and the format catalog for a URL.
    pub async fn info(&self, url: &str) -> Result<MediaInfo, FetchError> {
        let url = url.trim();
        if url.is_empty() {
            return Err(FetchError::invalid_request("url is required"));
        }

        let plan = self.builder.info_plan(url)?;
        let result = self.run_admitted(&plan).await;
        let output = Self::record_lookup("info", result)?;

        if output.stdout_truncated {
            return Err(FetchError::parse("metadata output exceeded capture limit"));
        }
        parse_info_output(&output.stdout)
    }

    fn record_lookup(
        operation: &str,
        result: Result<ProcessOutput, FetchError>,
    ) -> Result<ProcessOutput, FetchError> {
        let status = if result.is_ok() { "success" } else { "error" };
        metrics::LOOKUPS_TOTAL
            .with_label_values(&[operation, status])
            .inc();
        if let Err(e) = &result {
            warn!(operation, "Lookup failed: {}", e);
        }
        result
    }
}
