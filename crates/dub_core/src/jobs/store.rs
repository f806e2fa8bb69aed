//! Shared job table with a single writer per job.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;

use crate::models::{JobRequest, JobStage};
use crate::orchestrator::JobMetadata;

use super::types::{JobError, JobRecord, JobStatus};

type Table = Arc<RwLock<HashMap<String, JobRecord>>>;

/// Table of every job this process has accepted.
///
/// Cloning shares the table. Reads return snapshots; writes go through
/// the [`JobHandle`] returned by [`JobStore::create`].
#[derive(Debug, Clone, Default)]
pub struct JobStore {
    jobs: Table,
}

impl JobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a new record and hand out its only writer.
    pub fn create(&self, job_id: &str, request: &JobRequest) -> Result<JobHandle, JobError> {
        let mut jobs = self.jobs.write();
        if jobs.contains_key(job_id) {
            return Err(JobError::AlreadyExists(job_id.to_string()));
        }
        jobs.insert(job_id.to_string(), JobRecord::received(job_id, request));

        Ok(JobHandle {
            job_id: job_id.to_string(),
            jobs: Arc::clone(&self.jobs),
        })
    }

    /// Snapshot of one job.
    pub fn get(&self, job_id: &str) -> Option<JobRecord> {
        self.jobs.read().get(job_id).cloned()
    }

    /// Snapshots of every job, oldest first.
    pub fn list(&self) -> Vec<JobRecord> {
        let mut records: Vec<JobRecord> = self.jobs.read().values().cloned().collect();
        records.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.job_id.cmp(&b.job_id)));
        records
    }

    pub fn len(&self) -> usize {
        self.jobs.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.read().is_empty()
    }

    /// Remove a finished job and return its final record.
    pub fn forget(&self, job_id: &str) -> Result<JobRecord, JobError> {
        let mut jobs = self.jobs.write();
        match jobs.get(job_id) {
            None => Err(JobError::NotFound(job_id.to_string())),
            Some(record) if !record.is_finished() => Err(JobError::NotReady {
                job_id: job_id.to_string(),
                status: record.status,
            }),
            Some(_) => jobs
                .remove(job_id)
                .ok_or_else(|| JobError::NotFound(job_id.to_string())),
        }
    }

    /// Drop finished jobs that completed at or before `cutoff`.
    ///
    /// Returns how many records were removed.
    pub fn prune_finished(&self, cutoff: DateTime<Utc>) -> usize {
        let mut jobs = self.jobs.write();
        let before = jobs.len();
        jobs.retain(|_, record| {
            !(record.is_finished() && record.completed_at.is_some_and(|at| at <= cutoff))
        });
        before - jobs.len()
    }

    /// Drop a record whose worker never started.
    pub(crate) fn remove(&self, job_id: &str) {
        self.jobs.write().remove(job_id);
    }
}

/// Write access to one job's record. Not clonable.
///
/// Once the job is completed or failed, further updates are ignored.
#[derive(Debug)]
pub struct JobHandle {
    job_id: String,
    jobs: Table,
}

impl JobHandle {
    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    /// Move to a running stage. Progress never goes backwards.
    ///
    /// Terminal stages are set by [`complete`](Self::complete) and
    /// [`fail`](Self::fail) only.
    pub fn set_stage(&self, stage: JobStage, progress: u32, message: &str) {
        self.update(|record| {
            if !stage.is_terminal() && stage >= record.stage {
                record.stage = stage;
            }
            record.progress = record.progress.max(progress.min(100));
            record.message = message.to_string();
        });
    }

    pub fn complete(&self, output_path: PathBuf, metadata: JobMetadata) {
        self.update(|record| {
            record.status = JobStatus::Completed;
            record.stage = JobStage::Completed;
            record.progress = 100;
            record.message = format!("Dubbed audio written to {}", output_path.display());
            record.output_path = Some(output_path);
            record.metadata = Some(metadata);
            record.completed_at = Some(Utc::now());
        });
    }

    pub fn fail(&self, message: &str, metadata: Option<JobMetadata>) {
        self.update(|record| {
            record.status = JobStatus::Failed;
            record.stage = JobStage::Failed;
            record.message = message.to_string();
            record.metadata = metadata;
            record.completed_at = Some(Utc::now());
        });
    }

    fn update(&self, apply: impl FnOnce(&mut JobRecord)) {
        let mut jobs = self.jobs.write();
        let Some(record) = jobs.get_mut(&self.job_id) else {
            tracing::warn!("Job {} vanished from the store", self.job_id);
            return;
        };
        if record.is_finished() {
            tracing::debug!("Ignoring update to finished job {}", self.job_id);
            return;
        }
        apply(record);
        record.updated_at = Utc::now();
    }
}
