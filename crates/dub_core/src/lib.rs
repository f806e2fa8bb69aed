//! Dub Core - Backend logic for Dub Sync
//!
//! This crate turns a spoken recording in one language into a
//! timing-matched recording in another language. Speech recognition,
//! diarization, translation and synthesis are external collaborators
//! behind the traits in [`engines`]; this crate owns the orchestration
//! and timeline reconciliation around them.

pub mod alignment;
pub mod audio;
pub mod config;
pub mod engines;
pub mod jobs;
pub mod logging;
pub mod mixer;
pub mod models;
pub mod orchestrator;
pub mod references;
pub mod synthesis;
pub mod timing;

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
