//! Threaded dubbing service: one worker thread per job.

use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use parking_lot::Mutex;
use uuid::Uuid;

use crate::config::Settings;
use crate::engines::EngineFactory;
use crate::logging::LogCallback;
use crate::models::JobRequest;
use crate::orchestrator::{JobRunner, ProgressCallback, ProgressUpdate};

use super::store::{JobHandle, JobStore};
use super::types::{JobError, JobRecord};

/// Receives every job log line as `(job_id, line)`.
pub type LogSink = Arc<dyn Fn(&str, &str) + Send + Sync>;

/// Accepts dubbing requests and runs them in the background.
///
/// Each job gets its own thread and its own [`EngineSet`](crate::engines::EngineSet)
/// built by the factory, so jobs never share collaborators.
pub struct DubbingService {
    settings: Settings,
    factory: Arc<dyn EngineFactory>,
    store: JobStore,
    workers: Mutex<HashMap<String, JoinHandle<()>>>,
    log_sink: Option<LogSink>,
    /// Finished records older than this are dropped on the next submit.
    retention: Option<chrono::Duration>,
}

impl DubbingService {
    pub fn new(settings: Settings, factory: Arc<dyn EngineFactory>) -> Self {
        Self {
            settings,
            factory,
            store: JobStore::new(),
            workers: Mutex::new(HashMap::new()),
            log_sink: None,
            retention: None,
        }
    }

    /// Forget finished jobs once they are older than `retention`.
    pub fn with_retention(mut self, retention: chrono::Duration) -> Self {
        self.retention = Some(retention);
        self
    }

    /// Forward job log lines to `sink` as well as the log files.
    pub fn with_log_sink(mut self, sink: LogSink) -> Self {
        self.log_sink = Some(sink);
        self
    }

    pub fn store(&self) -> &JobStore {
        &self.store
    }

    /// Validate and start a job; returns its id.
    ///
    /// Invalid requests are rejected here, before any engine is built.
    pub fn submit(&self, request: JobRequest) -> Result<String, JobError> {
        request.validate()?;
        self.reap_finished();

        let job_id = format!("dub_{}", Uuid::new_v4().simple());
        let handle = self.store.create(&job_id, &request)?;
        let runner = JobRunner::from_settings(self.settings.clone());
        let factory = Arc::clone(&self.factory);
        let sink = self.log_sink.clone();

        tracing::info!("Job {} submitted: {}", job_id, request.input_path.display());
        let spawned = thread::Builder::new()
            .name(format!("dub-worker-{}", &job_id[4..12]))
            .spawn(move || run_worker(runner, factory, handle, request, sink));

        match spawned {
            Ok(worker) => {
                self.workers.lock().insert(job_id.clone(), worker);
                Ok(job_id)
            }
            Err(e) => {
                self.store.remove(&job_id);
                Err(JobError::Spawn(e))
            }
        }
    }

    /// Snapshot of a job.
    pub fn status(&self, job_id: &str) -> Result<JobRecord, JobError> {
        self.store
            .get(job_id)
            .ok_or_else(|| JobError::NotFound(job_id.to_string()))
    }

    /// Output of a completed job.
    pub fn output(&self, job_id: &str) -> Result<PathBuf, JobError> {
        self.status(job_id)?.output_or_error()
    }

    /// Block until the job's worker finishes, then return its record.
    pub fn wait(&self, job_id: &str) -> Result<JobRecord, JobError> {
        let worker = self.workers.lock().remove(job_id);
        if let Some(worker) = worker {
            worker
                .join()
                .map_err(|_| JobError::WorkerPanicked(job_id.to_string()))?;
        }
        self.status(job_id)
    }

    /// Drop a finished job's record and return it.
    pub fn forget(&self, job_id: &str) -> Result<JobRecord, JobError> {
        let record = self.store.forget(job_id)?;
        if let Some(worker) = self.workers.lock().remove(job_id) {
            let _ = worker.join();
        }
        Ok(record)
    }

    /// Join workers that have exited and apply the retention window.
    fn reap_finished(&self) {
        let finished: Vec<JoinHandle<()>> = {
            let mut workers = self.workers.lock();
            let done: Vec<String> = workers
                .iter()
                .filter(|(_, worker)| worker.is_finished())
                .map(|(job_id, _)| job_id.clone())
                .collect();
            done.iter().filter_map(|job_id| workers.remove(job_id)).collect()
        };
        for worker in finished {
            let _ = worker.join();
        }

        if let Some(retention) = self.retention {
            let pruned = self.store.prune_finished(chrono::Utc::now() - retention);
            if pruned > 0 {
                tracing::debug!("Pruned {} finished job(s)", pruned);
            }
        }
    }

    /// Submit and wait.
    pub fn run_job(&self, request: JobRequest) -> Result<JobRecord, JobError> {
        let job_id = self.submit(request)?;
        self.wait(&job_id)
    }

    /// Every job, oldest first.
    pub fn list(&self) -> Vec<JobRecord> {
        self.store.list()
    }
}

fn run_worker(
    runner: JobRunner,
    factory: Arc<dyn EngineFactory>,
    handle: JobHandle,
    request: JobRequest,
    sink: Option<LogSink>,
) {
    let handle = Arc::new(handle);
    let job_id = handle.job_id().to_string();

    let progress: ProgressCallback = {
        let handle = Arc::clone(&handle);
        Box::new(move |update: &ProgressUpdate| {
            handle.set_stage(update.stage, update.percent, &update.message);
        })
    };
    let log_callback = sink.map(|sink| {
        let job_id = job_id.clone();
        Box::new(move |line: &str| sink(&job_id, line)) as LogCallback
    });

    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        let mut engines = factory.create(runner.settings());
        runner.run(&job_id, &request, &mut engines, log_callback, Some(progress))
    }));

    match outcome {
        Ok(result) if result.success => {
            let output = result.output_path.unwrap_or_default();
            tracing::info!("Job {} completed: {}", job_id, output.display());
            handle.complete(output, result.metadata);
        }
        Ok(result) => {
            let message = result.error.unwrap_or_else(|| "unknown error".to_string());
            tracing::warn!("Job {} failed: {}", job_id, message);
            handle.fail(&message, Some(result.metadata));
        }
        Err(_) => {
            tracing::error!("Job {} worker panicked", job_id);
            handle.fail("internal error: worker panicked", None);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engines::mock::{MockFactory, SynthBehavior};
    use crate::jobs::JobStatus;
    use crate::models::{JobStage, ValidationError};
    use crate::orchestrator::fixtures::{sample_factory, sample_request, test_settings};
    use tempfile::tempdir;

    fn service(dir: &std::path::Path, factory: &MockFactory) -> DubbingService {
        DubbingService::new(test_settings(dir), Arc::new(factory.clone()))
    }

    fn worker_count(service: &DubbingService) -> usize {
        service.workers.lock().len()
    }

    #[test]
    fn finished_workers_are_reaped_on_submit() {
        let dir = tempdir().unwrap();
        let factory = sample_factory();
        let service = service(dir.path(), &factory);

        let first = service.submit(sample_request(dir.path())).unwrap();
        for _ in 0..400 {
            let done = service
                .workers
                .lock()
                .get(&first)
                .map_or(true, |worker| worker.is_finished());
            if done {
                break;
            }
            thread::sleep(std::time::Duration::from_millis(25));
        }

        let second = service.submit(sample_request(dir.path())).unwrap();
        assert!(!service.workers.lock().contains_key(&first));
        assert_eq!(service.status(&first).unwrap().status, JobStatus::Completed);

        service.wait(&second).unwrap();
        assert_eq!(worker_count(&service), 0);
    }

    #[test]
    fn retention_drops_old_finished_records() {
        let dir = tempdir().unwrap();
        let factory = sample_factory();
        let service =
            service(dir.path(), &factory).with_retention(chrono::Duration::zero());

        let first = service.run_job(sample_request(dir.path())).unwrap();
        let second = service.submit(sample_request(dir.path())).unwrap();

        assert!(matches!(service.status(&first.job_id), Err(JobError::NotFound(_))));
        assert!(service.status(&second).is_ok());
        service.wait(&second).unwrap();
    }

    #[test]
    fn forget_removes_a_finished_job() {
        let dir = tempdir().unwrap();
        let factory = sample_factory();
        let service = service(dir.path(), &factory);

        let record = service.run_job(sample_request(dir.path())).unwrap();
        let forgotten = service.forget(&record.job_id).unwrap();

        assert_eq!(forgotten.status, JobStatus::Completed);
        assert!(service.list().is_empty());
        assert!(matches!(service.forget("dub_missing"), Err(JobError::NotFound(_))));
    }

    #[test]
    fn same_language_is_rejected_before_any_engine() {
        let dir = tempdir().unwrap();
        let factory = sample_factory();
        let service = service(dir.path(), &factory);

        let err = service
            .submit(sample_request(dir.path()).with_source("es"))
            .unwrap_err();

        assert!(matches!(
            err,
            JobError::Validation(ValidationError::SameLanguage(ref code)) if code == "es"
        ));
        assert_eq!(factory.calls.created.get(), 0);
        assert_eq!(factory.calls.engine_calls(), 0);
        assert!(service.store().is_empty());
    }

    #[test]
    fn missing_input_is_rejected() {
        let dir = tempdir().unwrap();
        let factory = sample_factory();
        let service = service(dir.path(), &factory);

        let err = service
            .submit(JobRequest::new(dir.path().join("nope.mp4"), "es"))
            .unwrap_err();
        assert!(matches!(err, JobError::Validation(ValidationError::InputNotFound(_))));
    }

    #[test]
    fn completed_job_exposes_output() {
        let dir = tempdir().unwrap();
        let factory = sample_factory();
        let service = service(dir.path(), &factory);

        let job_id = service.submit(sample_request(dir.path())).unwrap();
        let record = service.wait(&job_id).unwrap();

        assert_eq!(record.status, JobStatus::Completed, "{}", record.message);
        assert_eq!(record.stage, JobStage::Completed);
        assert_eq!(record.progress, 100);
        let output = service.output(&job_id).unwrap();
        assert!(output.is_file());
        let metadata = record.metadata.unwrap();
        assert_eq!(metadata.detected_language.as_deref(), Some("en"));
        assert_eq!(factory.calls.created.get(), 1);
    }

    #[test]
    fn all_tiers_failing_never_completes() {
        let dir = tempdir().unwrap();
        let mut factory = sample_factory();
        factory.tiers = [SynthBehavior::Fail; 3];
        let service = service(dir.path(), &factory);

        let record = service.run_job(sample_request(dir.path())).unwrap();

        assert_eq!(record.status, JobStatus::Failed);
        assert_eq!(record.stage, JobStage::Failed);
        assert!(record.message.contains("Synthesize"));
        assert!(matches!(
            service.output(&record.job_id),
            Err(JobError::Failed { .. })
        ));
    }

    #[test]
    fn log_sink_receives_job_lines() {
        let dir = tempdir().unwrap();
        let factory = sample_factory();
        let lines: Arc<Mutex<Vec<String>>> = Arc::default();
        let captured = Arc::clone(&lines);
        let service = service(dir.path(), &factory).with_log_sink(Arc::new(move |_, line| {
            captured.lock().push(line.to_string());
        }));

        let record = service.run_job(sample_request(dir.path())).unwrap();

        assert_eq!(record.status, JobStatus::Completed);
        assert!(lines.lock().iter().any(|l| l.contains("Transcribe")));
    }

    #[test]
    fn unknown_job_is_not_found() {
        let dir = tempdir().unwrap();
        let service = service(dir.path(), &sample_factory());
        assert!(matches!(service.status("dub_x"), Err(JobError::NotFound(_))));
        assert!(service.wait("dub_x").is_err());
    }
}
