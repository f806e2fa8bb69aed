//! Dubbing job surface.
//!
//! [`DubbingService`] accepts requests, runs each job on its own worker
//! thread and exposes status snapshots from the shared [`JobStore`].
//! Only the worker running a job holds its [`JobHandle`] and may change
//! its record; everyone else reads copies.

mod service;
mod store;
mod types;

pub use service::{DubbingService, LogSink};
pub use store::{JobHandle, JobStore};
pub use types::{JobError, JobRecord, JobStatus};
