//! References step - one reference clip per speaker for voice cloning.

use crate::audio::read_wav;
use crate::engines::EngineSet;
use crate::models::JobStage;
use crate::orchestrator::errors::{StepError, StepResult};
use crate::orchestrator::step::PipelineStep;
use crate::orchestrator::types::{Context, JobState, StepOutcome};
use crate::references::{build_references, ReferenceConfig};

use super::require_extract;

pub struct ReferencesStep;

impl ReferencesStep {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ReferencesStep {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineStep for ReferencesStep {
    fn name(&self) -> &str {
        "References"
    }

    fn stage(&self) -> JobStage {
        JobStage::Transcribing
    }

    fn description(&self) -> &str {
        "Build speaker reference clips"
    }

    /// Without references the clone tier is skipped, not the job.
    fn is_optional(&self) -> bool {
        true
    }

    fn validate_input(&self, _ctx: &Context, state: &JobState) -> StepResult<()> {
        require_extract(state, self.name())?;
        if !state.has_transcription() {
            return Err(StepError::precondition_failed(
                "References needs segments from Transcribe",
            ));
        }
        Ok(())
    }

    fn execute(
        &self,
        ctx: &Context,
        _engines: &mut EngineSet,
        state: &mut JobState,
    ) -> StepResult<StepOutcome> {
        if state.segments.is_empty() {
            return Ok(StepOutcome::Skipped("no speech segments".to_string()));
        }

        let extract = require_extract(state, self.name())?;
        let source = read_wav(&extract.audio_path)?;
        let refs_dir = ctx.work_dir.join("refs");
        let config = ReferenceConfig::from(&ctx.settings.references);

        let references = build_references(&source, &state.segments, &refs_dir, &config)?;
        for reference in references.iter() {
            ctx.logger.info(&format!(
                "Reference for {}: {} clip(s), {:.1}s",
                reference.speaker_id, reference.clip_count, reference.duration_secs
            ));
        }

        state.references = Some(references);
        Ok(StepOutcome::Success)
    }

    fn validate_output(&self, _ctx: &Context, state: &JobState) -> StepResult<()> {
        let references = state
            .references
            .as_ref()
            .ok_or_else(|| StepError::invalid_output("References not recorded"))?;
        match references.iter().find(|r| !r.path.is_file()) {
            Some(missing) => Err(StepError::file_not_found(missing.path.display().to_string())),
            None => Ok(()),
        }
    }
}
