//! Jobs module: one download request from acceptance to a registered
//! artifact or a cleaned-up failure.
//!
//! A [`Job`] moves `Pending -> Running -> Succeeded | Failed`. The
//! [`JobRunner`] drives that lifecycle and also serves search and metadata
//! lookups, which share its admission limit.
//!
//! # Example
//!
//! ```ignore
//! use tubefetch_core::jobs::JobRunner;
//!
//! let runner = JobRunner::new(&config, executor, store);
//! let report = runner.download(request).await?;
//! println!("{} ({} bytes)", report.artifact.filename, report.artifact.size_bytes);
//! ```

mod runner;
mod types;

pub use runner::JobRunner;
pub use types::{Job, JobFailure, JobId, JobReport, JobState, JobStateError};
