//! HTTP surface for tubefetch.
//!
//! The binary in `main.rs` wires these modules to a real downloader; the
//! integration tests wire them to [`tubefetch_core::testing::MockExecutor`].

pub mod api;
pub mod metrics;
pub mod state;
