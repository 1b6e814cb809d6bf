//! Artifact module: output files of succeeded jobs and their lifecycle.
//!
//! - [`resolve`] finds a job's output by job id prefix.
//! - [`ArtifactStore`] registers artifacts and serves lookups.
//! - [`GarbageCollector`] deletes files older than the TTL, on a timer and
//!   on demand.

mod gc;
mod resolver;
mod store;
mod types;

pub use gc::GarbageCollector;
pub use resolver::{remove_job_files, resolve};
pub use store::ArtifactStore;
pub use types::{Artifact, CleanupPolicy, ResolvedFile, StoreStats, SweepReport};
