//! Fetcher module: everything between a validated request and the external
//! downloader process.
//!
//! - [`ArgumentBuilder`] turns requests into [`InvocationPlan`]s (ordered argv,
//!   timeout, output capture limit). Caller text is passed through [`sanitize`].
//! - [`ProcessExecutor`] runs a plan. [`TokioProcessExecutor`] is the real
//!   implementation; it never goes through a shell, enforces the plan's timeout
//!   and bounds captured output.
//! - [`parse_search_output`] and [`parse_info_output`] turn the tool's stdout
//!   into [`SearchHit`]s and [`MediaInfo`].
//!
//! # Example
//!
//! ```ignore
//! use tubefetch_core::fetcher::{ArgumentBuilder, ProcessExecutor, TokioProcessExecutor};
//!
//! let builder = ArgumentBuilder::new(config.fetcher.clone());
//! let plan = builder.search_plan("never gonna give you up", 5)?;
//! let output = TokioProcessExecutor::new().run(&plan).await?;
//! let hits = parse_search_output(&output.stdout);
//! ```

mod args;
mod error;
mod executor;
mod parse;
mod types;

pub use args::{sanitize, ArgumentBuilder, BLOCKED_CHARS, SEARCH_FIELD_DELIMITER, SEARCH_PRINT_TEMPLATE};
pub use error::FetchError;
pub use executor::{ProcessExecutor, TokioProcessExecutor};
pub use parse::{parse_info_output, parse_search_output};
pub use types::{
    DownloadRequest, FormatCatalog, FormatInfo, InvocationPlan, MediaInfo, MediaKind,
    ProcessOutput, Quality, SearchHit,
};
