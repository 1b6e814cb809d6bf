//! Mock process executor for testing.

use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

use crate::fetcher::{FetchError, InvocationPlan, ProcessExecutor, ProcessOutput};

/// Placeholder the real tool expands to the chosen extension.
const EXT_PLACEHOLDER: &str = "%(ext)s";

/// Scripted failure modes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockFailure {
    /// Non-zero exit with the given diagnostic.
    Tool { exit_code: i32, message: String },
    /// Wall-clock limit hit; returned immediately.
    Timeout,
    /// The executable could not be started.
    Spawn,
}

/// Mock implementation of the ProcessExecutor trait.
///
/// Stands in for the external downloader:
/// - Writes output files next to the `-o` template of download plans
/// - Returns scripted stdout for searches and metadata dumps
/// - Simulates failures, slow runs and timeouts
/// - Records every plan and tracks peak concurrency
///
/// # Example
///
/// ```rust,ignore
/// use tubefetch_core::testing::{MockExecutor, MockFailure};
///
/// let executor = MockExecutor::new();
/// executor.set_outputs(vec![("mp4", 4096)]).await;
///
/// let runner = JobRunner::new(&config, Arc::new(executor.clone()), store);
/// let report = runner.download(request).await?;
///
/// assert_eq!(executor.recorded_plans().await.len(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct MockExecutor {
    /// Plans received, in call order.
    plans: Arc<RwLock<Vec<InvocationPlan>>>,
    /// Files written for a download plan, as (extension, size).
    outputs: Arc<RwLock<Vec<(String, usize)>>>,
    /// Stdout returned on success.
    stdout: Arc<RwLock<String>>,
    /// If set, every run fails this way.
    failure: Arc<RwLock<Option<MockFailure>>>,
    /// Whether a failing download leaves a partial file behind.
    partial_on_failure: Arc<RwLock<bool>>,
    /// Simulated run duration.
    delay: Arc<RwLock<Duration>>,
    running: Arc<AtomicUsize>,
    peak: Arc<AtomicUsize>,
}

impl Default for MockExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl MockExecutor {
    /// Create a mock that produces one 1 KiB mp4 per download.
    pub fn new() -> Self {
        Self {
            plans: Arc::new(RwLock::new(Vec::new())),
            outputs: Arc::new(RwLock::new(vec![("mp4".to_string(), 1024)])),
            stdout: Arc::new(RwLock::new(String::new())),
            failure: Arc::new(RwLock::new(None)),
            partial_on_failure: Arc::new(RwLock::new(true)),
            delay: Arc::new(RwLock::new(Duration::ZERO)),
            running: Arc::new(AtomicUsize::new(0)),
            peak: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Set the files a download produces.
    pub async fn set_outputs<S: Into<String>>(&self, outputs: Vec<(S, usize)>) {
        *self.outputs.write().await = outputs.into_iter().map(|(e, n)| (e.into(), n)).collect();
    }

    /// Set the stdout returned by successful runs.
    pub async fn set_stdout(&self, stdout: impl Into<String>) {
        *self.stdout.write().await = stdout.into();
    }

    /// Make every following run fail, or clear the failure with `None`.
    pub async fn set_failure(&self, failure: Option<MockFailure>) {
        *self.failure.write().await = failure;
    }

    pub async fn set_partial_on_failure(&self, enabled: bool) {
        *self.partial_on_failure.write().await = enabled;
    }

    /// Make runs take this long. A delay past the plan's timeout produces a
    /// `Timeout` once the timeout elapses.
    pub async fn set_delay(&self, delay: Duration) {
        *self.delay.write().await = delay;
    }

    /// Get all plans received so far.
    pub async fn recorded_plans(&self) -> Vec<InvocationPlan> {
        self.plans.read().await.clone()
    }

    /// Highest number of runs in flight at once.
    pub fn peak_concurrency(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    /// Output template of a download plan (`-o` value), if any.
    fn output_template(plan: &InvocationPlan) -> Option<String> {
        plan.args
            .iter()
            .position(|a| a == "-o")
            .and_then(|i| plan.args.get(i + 1))
            .cloned()
    }

    async fn write_file(template: &str, ext: &str, size: usize) -> Result<(), FetchError> {
        let path = PathBuf::from(template.replace(EXT_PLACEHOLDER, ext));
        tokio::fs::write(&path, vec![0u8; size]).await?;
        Ok(())
    }

    async fn fail(&self, plan: &InvocationPlan, failure: MockFailure) -> FetchError {
        if *self.partial_on_failure.read().await {
            if let Some(template) = Self::output_template(plan) {
                let _ = Self::write_file(&template, "mp4.part", 512).await;
            }
        }

        match failure {
            MockFailure::Tool { exit_code, message } => FetchError::ToolError {
                exit_code: Some(exit_code),
                message,
            },
            MockFailure::Timeout => FetchError::Timeout {
                timeout_secs: plan.timeout.as_secs(),
            },
            MockFailure::Spawn => FetchError::SpawnError {
                program: plan.program.clone(),
                reason: "executable not found".to_string(),
            },
        }
    }

    async fn run_inner(&self, plan: &InvocationPlan) -> Result<ProcessOutput, FetchError> {
        let start = Instant::now();

        let delay = *self.delay.read().await;
        if delay > plan.timeout {
            tokio::time::sleep(plan.timeout).await;
            return Err(self.fail(plan, MockFailure::Timeout).await);
        }
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        if let Some(failure) = self.failure.read().await.clone() {
            return Err(self.fail(plan, failure).await);
        }

        if let Some(template) = Self::output_template(plan) {
            for (ext, size) in self.outputs.read().await.iter() {
                Self::write_file(&template, ext, *size).await?;
            }
        }

        Ok(ProcessOutput {
            exit_code: Some(0),
            stdout: self.stdout.read().await.clone(),
            elapsed: start.elapsed(),
            ..Default::default()
        })
    }
}

#[async_trait]
impl ProcessExecutor for MockExecutor {
    fn name(&self) -> &str {
        "mock"
    }

    async fn run(&self, plan: &InvocationPlan) -> Result<ProcessOutput, FetchError> {
        self.plans.write().await.push(plan.clone());

        let now = self.running.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);

        let result = self.run_inner(plan).await;

        self.running.fetch_sub(1, Ordering::SeqCst);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn download_plan(dir: &std::path::Path, id: &str) -> InvocationPlan {
        InvocationPlan {
            program: PathBuf::from("yt-dlp"),
            args: vec![
                "-o".to_string(),
                dir.join(format!("{}.%(ext)s", id)).to_string_lossy().to_string(),
                "--".to_string(),
                "https://example.com/v".to_string(),
            ],
            timeout: Duration::from_secs(5),
            max_output_bytes: 1024,
        }
    }

    #[tokio::test]
    async fn test_writes_configured_outputs() {
        let tmp = TempDir::new().unwrap();
        let mock = MockExecutor::new();
        mock.set_outputs(vec![("f137.mp4", 10), ("mp4", 20)]).await;

        mock.run(&download_plan(tmp.path(), "job")).await.unwrap();
        assert_eq!(std::fs::metadata(tmp.path().join("job.mp4")).unwrap().len(), 20);
        assert!(tmp.path().join("job.f137.mp4").exists());
        assert_eq!(mock.recorded_plans().await.len(), 1);
    }

    #[tokio::test]
    async fn test_failure_leaves_partial() {
        let tmp = TempDir::new().unwrap();
        let mock = MockExecutor::new();
        mock.set_failure(Some(MockFailure::Tool {
            exit_code: 1,
            message: "ERROR: unavailable".to_string(),
        }))
        .await;

        let err = mock.run(&download_plan(tmp.path(), "job")).await.unwrap_err();
        assert!(matches!(err, FetchError::ToolError { exit_code: Some(1), .. }));
        assert!(tmp.path().join("job.mp4.part").exists());
        assert!(!tmp.path().join("job.mp4").exists());
    }

    #[tokio::test]
    async fn test_delay_past_timeout() {
        let tmp = TempDir::new().unwrap();
        let mock = MockExecutor::new();
        mock.set_delay(Duration::from_secs(60)).await;

        let mut plan = download_plan(tmp.path(), "job");
        plan.timeout = Duration::from_millis(50);
        let err = mock.run(&plan).await.unwrap_err();
        assert!(matches!(err, FetchError::Timeout { .. }));
    }
}
