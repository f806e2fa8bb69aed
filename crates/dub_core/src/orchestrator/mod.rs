//! Pipeline orchestrator for coordinating dubbing jobs.
//!
//! Each job runs a fixed sequence of steps that validate, execute, and
//! record their results in a shared `JobState`.
//!
//! # Architecture
//!
//! ```text
//! Pipeline
//!     ├── Step: Extract       (transcribing)
//!     ├── Step: Transcribe    (transcribing)
//!     ├── Step: References    (transcribing)
//!     ├── Step: Translate     (translating)
//!     ├── Step: Synthesize    (synthesizing)
//!     ├── Step: AlignTiming   (synthesizing)
//!     └── Step: Mix           (mixing)
//! ```
//!
//! # Example
//!
//! ```ignore
//! use dub_core::orchestrator::{create_standard_pipeline, Context, JobState};
//!
//! let pipeline = create_standard_pipeline();
//! let ctx = Context::new(request, settings, "dub_1234", work_dir, output_dir, logger);
//! let mut state = JobState::new("dub_1234");
//!
//! let result = pipeline.run(&ctx, &mut engines, &mut state)?;
//! println!("Completed: {:?}", result.steps_completed);
//! ```

mod errors;
#[cfg(test)]
pub(crate) mod fixtures;
mod pipeline;
mod runner;
mod step;
pub mod steps;
mod types;

pub use errors::{PipelineError, PipelineResult, StepError, StepResult};
pub use pipeline::{Pipeline, PipelineRunResult};
pub use runner::{JobResult, JobRunner};
pub use step::PipelineStep;
pub use steps::{
    AlignTimingStep, ExtractStep, MixStep, ReferencesStep, SynthesizeStep, TranscribeStep,
    TranslateStep,
};
pub use types::{
    Context, ExtractOutput, JobMetadata, JobState, MixOutput, ProgressCallback, ProgressUpdate,
    StepOutcome, TranscriptionOutput, TranslationOutput,
};

/// Create a standard pipeline with all steps in the correct order.
pub fn create_standard_pipeline() -> Pipeline {
    Pipeline::new()
        .with_step(ExtractStep::new())
        .with_step(TranscribeStep::new())
        .with_step(ReferencesStep::new())
        .with_step(TranslateStep::new())
        .with_step(SynthesizeStep::new())
        .with_step(AlignTimingStep::new())
        .with_step(MixStep::new())
}
