//! Job identity and lifecycle types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

use crate::artifact::Artifact;
use crate::fetcher::{DownloadRequest, FetchError};

/// Opaque job identifier.
///
/// Always 32 lowercase hex characters. Because every id has the same length,
/// no id can be a strict prefix of another, which keeps the output resolver's
/// prefix scan collision-free.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    pub const LEN: usize = 32;

    pub fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    /// Parses an id, accepting only the generated shape.
    pub fn parse(s: &str) -> Option<Self> {
        let valid = s.len() == Self::LEN
            && s.bytes().all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b));
        valid.then(|| Self(s.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lifecycle state of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    Pending,
    Running,
    Succeeded,
    Failed,
}

impl JobState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed)
    }

    fn can_transition_to(&self, next: JobState) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Running)
                | (Self::Pending, Self::Failed)
                | (Self::Running, Self::Succeeded)
                | (Self::Running, Self::Failed)
        )
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Invalid job state transition: {from} -> {to}")]
pub struct JobStateError {
    pub from: JobState,
    pub to: JobState,
}

/// One accepted request and its execution record.
#[derive(Debug, Clone, Serialize)]
pub struct Job {
    pub id: JobId,
    pub request: DownloadRequest,
    pub invocation_args: Vec<String>,
    pub accepted_at: DateTime<Utc>,
    /// Set when the job leaves the admission queue and starts running.
    pub started_at: Option<DateTime<Utc>>,
    state: JobState,
}

impl Job {
    pub fn new(request: DownloadRequest) -> Self {
        Self {
            id: JobId::generate(),
            request,
            invocation_args: Vec::new(),
            accepted_at: Utc::now(),
            started_at: None,
            state: JobState::Pending,
        }
    }

    pub fn state(&self) -> JobState {
        self.state
    }

    pub fn transition(&mut self, next: JobState) -> Result<(), JobStateError> {
        if !self.state.can_transition_to(next) {
            return Err(JobStateError {
                from: self.state,
                to: next,
            });
        }
        if next == JobState::Running {
            self.started_at = Some(Utc::now());
        }
        self.state = next;
        Ok(())
    }
}

/// Successful job result.
#[derive(Debug, Clone)]
pub struct JobReport {
    pub job: Job,
    pub artifact: Artifact,
    pub elapsed: Duration,
    /// Set when the artifact is larger than the configured warning threshold.
    pub oversized: bool,
}

/// Failed job result.
#[derive(Debug, Error)]
#[error("Job failed: {error}")]
pub struct JobFailure {
    /// `None` when the request was rejected before a job was created.
    pub job_id: Option<JobId>,
    #[source]
    pub error: FetchError,
}

impl JobFailure {
    pub fn rejected(error: FetchError) -> Self {
        Self {
            job_id: None,
            error,
        }
    }
}

impl From<JobFailure> for FetchError {
    fn from(failure: JobFailure) -> Self {
        failure.error
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetcher::{MediaKind, Quality};
    use crate::source::NormalizedSource;
    use std::collections::HashSet;

    fn request() -> DownloadRequest {
        DownloadRequest::new(
            NormalizedSource::Url("https://www.youtube.com/watch?v=dQw4w9WgXcQ".to_string()),
            MediaKind::Video,
            Quality::Medium,
        )
        .unwrap()
    }

    #[test]
    fn test_job_id_shape() {
        let id = JobId::generate();
        assert_eq!(id.as_str().len(), JobId::LEN);
        assert!(JobId::parse(id.as_str()).is_some());
    }

    #[test]
    fn test_job_id_parse_rejects_other_shapes() {
        assert!(JobId::parse("../etc/passwd").is_none());
        assert!(JobId::parse("ABCDEF0123456789ABCDEF0123456789").is_none());
        assert!(JobId::parse("abc").is_none());
    }

    #[test]
    fn test_job_ids_unique() {
        let ids: HashSet<JobId> = (0..1000).map(|_| JobId::generate()).collect();
        assert_eq!(ids.len(), 1000);
    }

    #[test]
    fn test_job_happy_path_transitions() {
        let mut job = Job::new(request());
        assert_eq!(job.state(), JobState::Pending);
        assert!(job.started_at.is_none());
        job.transition(JobState::Running).unwrap();
        assert!(job.started_at.unwrap() >= job.accepted_at);
        job.transition(JobState::Succeeded).unwrap();
        assert!(job.state().is_terminal());
    }

    #[test]
    fn test_terminal_states_are_final() {
        let mut job = Job::new(request());
        job.transition(JobState::Running).unwrap();
        job.transition(JobState::Failed).unwrap();
        let err = job.transition(JobState::Running).unwrap_err();
        assert_eq!(err.from, JobState::Failed);
        assert_eq!(err.to, JobState::Running);
    }

    #[test]
    fn test_pending_cannot_skip_to_succeeded() {
        let mut job = Job::new(request());
        assert!(job.transition(JobState::Succeeded).is_err());
    }
}
