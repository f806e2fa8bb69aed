//! Job runner: one request through the standard pipeline.
//!
//! The runner owns directory layout, logger creation and the conversion
//! of a pipeline outcome into a terminal `JobResult`. Engines are passed
//! in by the caller, which owns them for the life of the worker.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use crate::config::Settings;
use crate::engines::EngineSet;
use crate::logging::{JobLogger, LogCallback, LogConfig};
use crate::models::JobRequest;

use super::create_standard_pipeline;
use super::errors::{PipelineError, PipelineResult};
use super::pipeline::PipelineRunResult;
use super::types::{Context, JobMetadata, JobState, ProgressCallback};

/// Result of running a single job.
#[derive(Debug, Clone)]
pub struct JobResult {
    pub job_id: String,
    pub success: bool,
    /// Path to the dubbed track (if successful).
    pub output_path: Option<PathBuf>,
    /// Error message (if failed).
    pub error: Option<String>,
    pub steps_completed: Vec<String>,
    pub steps_skipped: Vec<String>,
    /// What the job produced, as far as it got.
    pub metadata: JobMetadata,
}

impl JobResult {
    pub fn success(
        job_id: String,
        output_path: PathBuf,
        run_result: PipelineRunResult,
        metadata: JobMetadata,
    ) -> Self {
        Self {
            job_id,
            success: true,
            output_path: Some(output_path),
            error: None,
            steps_completed: run_result.steps_completed,
            steps_skipped: run_result.steps_skipped,
            metadata,
        }
    }

    pub fn failure(job_id: String, error: impl Into<String>) -> Self {
        Self {
            job_id,
            success: false,
            output_path: None,
            error: Some(error.into()),
            steps_completed: Vec::new(),
            steps_skipped: Vec::new(),
            metadata: JobMetadata::default(),
        }
    }

    fn with_metadata(mut self, metadata: JobMetadata) -> Self {
        self.metadata = metadata;
        self
    }
}

/// Runs dubbing jobs through the standard pipeline.
pub struct JobRunner {
    settings: Settings,
    log_dir: PathBuf,
    /// Parent of every job's work directory.
    work_root: PathBuf,
    output_dir: PathBuf,
}

impl JobRunner {
    pub fn new(settings: Settings, log_dir: PathBuf, work_root: PathBuf, output_dir: PathBuf) -> Self {
        Self {
            settings,
            log_dir,
            work_root,
            output_dir,
        }
    }

    /// Runner using the folders from `[paths]`.
    pub fn from_settings(settings: Settings) -> Self {
        let log_dir = PathBuf::from(&settings.paths.logs_folder);
        let work_root = PathBuf::from(&settings.paths.temp_root);
        let output_dir = PathBuf::from(&settings.paths.output_folder);
        Self::new(settings, log_dir, work_root, output_dir)
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Work directory for a job.
    pub fn work_dir(&self, job_id: &str) -> PathBuf {
        self.work_root.join(job_id)
    }

    /// Run one job to a terminal result.
    ///
    /// The request is validated again here so direct callers get the same
    /// fail-fast behavior as service submissions.
    pub fn run(
        &self,
        job_id: &str,
        request: &JobRequest,
        engines: &mut EngineSet,
        log_callback: Option<LogCallback>,
        progress_callback: Option<ProgressCallback>,
    ) -> JobResult {
        let logger = match self.prepare(job_id, request, log_callback) {
            Ok(logger) => logger,
            Err(e) => {
                tracing::warn!(job = job_id, "{}", e);
                return JobResult::failure(job_id.to_string(), e.user_message());
            }
        };
        let work_dir = self.work_dir(job_id);

        let mut ctx = Context::new(
            request.clone(),
            self.settings.clone(),
            job_id,
            work_dir.clone(),
            self.output_dir.clone(),
            logger,
        );
        if let Some(callback) = progress_callback {
            ctx = ctx.with_progress_callback(callback);
        }

        let mut state = JobState::new(job_id);
        let pipeline = create_standard_pipeline();

        ctx.logger.info(&format!("Starting job: {}", job_id));
        ctx.logger
            .info(&format!("Input: {}", request.input_path.display()));
        ctx.logger.info(&format!(
            "Languages: {} → {}",
            request.source_lang,
            ctx.target_lang()
        ));

        let result = match pipeline.run(&ctx, engines, &mut state) {
            Ok(run_result) => {
                let output_path = state
                    .mix
                    .as_ref()
                    .map(|m| m.output_path.clone())
                    .unwrap_or_else(|| ctx.output_path());

                ctx.logger
                    .info(&format!("Job completed: {}", output_path.display()));
                self.cleanup(&ctx, &work_dir);
                JobResult::success(
                    job_id.to_string(),
                    output_path,
                    run_result,
                    JobMetadata::from_state(&state),
                )
            }
            Err(e) => {
                ctx.logger.error(&format!("Pipeline failed: {}", e));
                ctx.logger.show_tail("Last log lines");
                ctx.logger
                    .info(&format!("Full log: {}", ctx.logger.log_path().display()));
                JobResult::failure(job_id.to_string(), e.user_message())
                    .with_metadata(JobMetadata::from_state(&state))
            }
        };

        ctx.logger.flush();
        result
    }

    /// Validate the request, then create the work directory and job logger.
    fn prepare(
        &self,
        job_id: &str,
        request: &JobRequest,
        log_callback: Option<LogCallback>,
    ) -> PipelineResult<Arc<JobLogger>> {
        request
            .validate()
            .map_err(|e| PipelineError::validation_failed(job_id, e))?;

        fs::create_dir_all(self.work_dir(job_id)).map_err(|e| {
            PipelineError::setup_failed(job_id, format!("Failed to create work directory: {}", e))
        })?;

        let logger = JobLogger::new(
            job_id,
            &self.log_dir,
            LogConfig::from_settings(&self.settings.logging),
            log_callback,
        )
        .map_err(|e| PipelineError::setup_failed(job_id, format!("Failed to create logger: {}", e)))?;

        Ok(Arc::new(logger))
    }

    /// Remove the work directory unless intermediates were requested.
    fn cleanup(&self, ctx: &Context, work_dir: &std::path::Path) {
        let output = &self.settings.output;
        if !output.cleanup_work_dir || output.save_intermediates {
            return;
        }
        if let Err(e) = fs::remove_dir_all(work_dir) {
            ctx.logger.warn(&format!(
                "Could not remove work directory {}: {}",
                work_dir.display(),
                e
            ));
        }
    }
}
