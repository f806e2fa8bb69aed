//! Pipeline step trait definition.

use crate::engines::EngineSet;
use crate::models::JobStage;

use super::errors::StepResult;
use super::types::{Context, JobState, StepOutcome};

/// Trait for pipeline steps.
///
/// The pipeline runner calls these methods in order:
///
/// 1. `validate_input` - Check preconditions before execution
/// 2. `execute` - Perform the step's work
/// 3. `validate_output` - Verify the step produced valid output
///
/// Engines are owned by the worker running the job and lent to each step
/// in turn; a step never keeps them.
pub trait PipelineStep: Send + Sync {
    /// Get the step name (for logging and error context).
    fn name(&self) -> &str;

    /// Job stage reported while this step runs.
    fn stage(&self) -> JobStage;

    /// Validate inputs before execution.
    ///
    /// Should check that earlier steps recorded what this one needs.
    fn validate_input(&self, ctx: &Context, state: &JobState) -> StepResult<()>;

    /// Execute the step's main work and record results in `state`.
    ///
    /// Returns `StepOutcome::Skipped` when there is nothing to do.
    fn execute(
        &self,
        ctx: &Context,
        engines: &mut EngineSet,
        state: &mut JobState,
    ) -> StepResult<StepOutcome>;

    /// Validate outputs after a successful `execute`.
    fn validate_output(&self, ctx: &Context, state: &JobState) -> StepResult<()>;

    /// Whether this step can be skipped.
    fn is_optional(&self) -> bool {
        false
    }

    /// Human-readable description of what this step does.
    fn description(&self) -> &str {
        self.name()
    }
}
