//! Job record and error types.

use std::io;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{JobRequest, JobStage, ValidationError};
use crate::orchestrator::JobMetadata;

/// Terminal-or-not state of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Processing,
    Completed,
    Failed,
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            JobStatus::Processing => "processing",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        };
        write!(f, "{}", name)
    }
}

/// Snapshot of one job as seen by pollers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRecord {
    pub job_id: String,
    pub status: JobStatus,
    pub stage: JobStage,
    /// Coarse percentage, updated at step boundaries.
    pub progress: u32,
    pub message: String,
    pub input_path: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_path: Option<PathBuf>,
    pub source_lang: String,
    pub target_lang: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<JobMetadata>,
}

impl JobRecord {
    /// Fresh record for a just-submitted request.
    pub fn received(job_id: impl Into<String>, request: &JobRequest) -> Self {
        let now = Utc::now();
        Self {
            job_id: job_id.into(),
            status: JobStatus::Processing,
            stage: JobStage::Received,
            progress: 0,
            message: "Job received".to_string(),
            input_path: request.input_path.clone(),
            output_path: None,
            source_lang: request.source_lang.clone(),
            target_lang: request.target(),
            created_at: now,
            updated_at: now,
            completed_at: None,
            metadata: None,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.status != JobStatus::Processing
    }
}

/// Errors from the job surface.
#[derive(Error, Debug)]
pub enum JobError {
    /// Request rejected before any work started.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Job '{0}' not found")]
    NotFound(String),

    #[error("Job '{0}' already exists")]
    AlreadyExists(String),

    /// Output asked for while the job is still running.
    #[error("Job '{job_id}' is still {status}")]
    NotReady { job_id: String, status: JobStatus },

    /// Output asked for a job that failed.
    #[error("Job '{job_id}' failed: {message}")]
    Failed { job_id: String, message: String },

    #[error("Failed to start worker: {0}")]
    Spawn(#[source] io::Error),

    #[error("Worker for job '{0}' panicked")]
    WorkerPanicked(String),
}

impl JobRecord {
    /// Output path of a completed job, or why there is none.
    pub fn output_or_error(&self) -> Result<PathBuf, JobError> {
        match (self.status, &self.output_path) {
            (JobStatus::Completed, Some(path)) => Ok(path.clone()),
            (JobStatus::Failed, _) => Err(JobError::Failed {
                job_id: self.job_id.clone(),
                message: self.message.clone(),
            }),
            (status, _) => Err(JobError::NotReady {
                job_id: self.job_id.clone(),
                status,
            }),
        }
    }
}
