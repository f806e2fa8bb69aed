//! Pipeline runner that executes steps in sequence.

use crate::engines::EngineSet;
use crate::models::JobStage;

use super::errors::{PipelineError, PipelineResult, StepResult};
use super::step::PipelineStep;
use super::types::{Context, JobState, StepOutcome};

/// Pipeline that runs a sequence of steps.
///
/// Each step is attempted once. The first error stops the run; there is
/// no retry and no partial resume.
pub struct Pipeline {
    steps: Vec<Box<dyn PipelineStep>>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self { steps: Vec::new() }
    }

    pub fn add_step<S: PipelineStep + 'static>(&mut self, step: S) -> &mut Self {
        self.steps.push(Box::new(step));
        self
    }

    /// Add a step (builder pattern).
    pub fn with_step<S: PipelineStep + 'static>(mut self, step: S) -> Self {
        self.add_step(step);
        self
    }

    /// Run the pipeline with the given context, engines and state.
    ///
    /// Executes each step in order:
    /// 1. Report progress at the step boundary
    /// 2. Run `validate_input`
    /// 3. Run `execute`
    /// 4. Run `validate_output` (if execute returned Success)
    ///
    /// A failure in an optional step is logged and the step counts as
    /// skipped; any other failure ends the run.
    pub fn run(
        &self,
        ctx: &Context,
        engines: &mut EngineSet,
        state: &mut JobState,
    ) -> PipelineResult<PipelineRunResult> {
        let mut result = PipelineRunResult {
            steps_completed: Vec::new(),
            steps_skipped: Vec::new(),
        };

        let total_steps = self.steps.len().max(1);

        for (i, step) in self.steps.iter().enumerate() {
            let step_name = step.name();
            ctx.logger.phase(step_name);

            let percent = ((i as f64 / total_steps as f64) * 100.0) as u32;
            ctx.report_progress(
                step_name,
                step.stage(),
                percent,
                &format!("Starting {}", step.description()),
            );

            match run_step(step.as_ref(), ctx, engines, state) {
                Ok(StepOutcome::Success) => {
                    ctx.logger.success(&format!("{} completed", step_name));
                    result.steps_completed.push(step_name.to_string());
                }
                Ok(StepOutcome::Skipped(reason)) => {
                    ctx.logger
                        .info(&format!("{} skipped: {}", step_name, reason));
                    result.steps_skipped.push(step_name.to_string());
                }
                Err(e) if step.is_optional() => {
                    ctx.logger
                        .warn(&format!("{} failed, continuing without it: {}", step_name, e));
                    result.steps_skipped.push(step_name.to_string());
                }
                Err(e) => return Err(PipelineError::step_failed(&ctx.job_id, step_name, e)),
            }
        }

        ctx.report_progress("Complete", JobStage::Completed, 100, "Pipeline finished");
        ctx.logger.success("Pipeline completed successfully");

        Ok(result)
    }

    pub fn step_count(&self) -> usize {
        self.steps.len()
    }

    /// Get step names in order.
    pub fn step_names(&self) -> Vec<&str> {
        self.steps.iter().map(|s| s.name()).collect()
    }
}

/// Validate, execute and check one step.
fn run_step(
    step: &dyn PipelineStep,
    ctx: &Context,
    engines: &mut EngineSet,
    state: &mut JobState,
) -> StepResult<StepOutcome> {
    let step_name = step.name();

    ctx.logger
        .debug(&format!("Validating input for '{}'", step_name));
    step.validate_input(ctx, state).map_err(|e| {
        ctx.logger.error(&format!("Input validation failed: {}", e));
        e
    })?;

    ctx.logger.debug(&format!("Executing '{}'", step_name));
    let outcome = step.execute(ctx, engines, state).map_err(|e| {
        ctx.logger.error(&format!("Execution failed: {}", e));
        e
    })?;

    if outcome == StepOutcome::Success {
        ctx.logger
            .debug(&format!("Validating output for '{}'", step_name));
        step.validate_output(ctx, state).map_err(|e| {
            ctx.logger.error(&format!("Output validation failed: {}", e));
            e
        })?;
    }
    Ok(outcome)
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}

/// Result of a pipeline run.
#[derive(Debug, Clone, Default)]
pub struct PipelineRunResult {
    /// Steps that completed successfully.
    pub steps_completed: Vec<String>,
    /// Steps that were skipped.
    pub steps_skipped: Vec<String>,
}

impl PipelineRunResult {
    /// Check if all steps completed (none skipped).
    pub fn all_completed(&self) -> bool {
        self.steps_skipped.is_empty()
    }

    /// Total number of steps that ran.
    pub fn total_steps(&self) -> usize {
        self.steps_completed.len() + self.steps_skipped.len()
    }
}
