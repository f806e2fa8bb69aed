//! Synthesize step - tiered speech synthesis for every segment.
//!
//! A segment whose tiers all fail is left silent; the job only fails when
//! no segment at all produced audio.

use std::fs;

use crate::engines::EngineSet;
use crate::models::JobStage;
use crate::orchestrator::errors::{StepError, StepResult};
use crate::orchestrator::step::PipelineStep;
use crate::orchestrator::types::{Context, JobState, StepOutcome};

use super::save_intermediate;

pub struct SynthesizeStep;

impl SynthesizeStep {
    pub fn new() -> Self {
        Self
    }
}

impl Default for SynthesizeStep {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineStep for SynthesizeStep {
    fn name(&self) -> &str {
        "Synthesize"
    }

    fn stage(&self) -> JobStage {
        JobStage::Synthesizing
    }

    fn description(&self) -> &str {
        "Synthesize translated speech"
    }

    fn validate_input(&self, _ctx: &Context, state: &JobState) -> StepResult<()> {
        if state.segments.is_empty() {
            return Err(StepError::precondition_failed("no speech segments to synthesize"));
        }
        Ok(())
    }

    fn execute(
        &self,
        ctx: &Context,
        engines: &mut EngineSet,
        state: &mut JobState,
    ) -> StepResult<StepOutcome> {
        let tts_dir = ctx.work_dir.join("tts");
        fs::create_dir_all(&tts_dir)
            .map_err(|e| StepError::io_error("creating synthesis directory", e))?;

        let target = ctx.target_lang();
        let tiers: Vec<String> = engines
            .synthesis
            .tiers()
            .iter()
            .map(|t| t.letter().to_string())
            .collect();
        ctx.logger.info(&format!(
            "Synthesizing {} segments in '{}' (tiers {})",
            state.segments.len(),
            target,
            tiers.join(" → ")
        ));

        let references = state.references();
        let report =
            engines
                .synthesis
                .batch_clone_voices(&mut state.segments, &references, &target, &tts_dir);

        ctx.logger.section("Voices");
        for voice in report.voices.values() {
            ctx.logger.info(&format!(
                "Voice {}: {}, preset {}, reference {}",
                voice.speaker_id,
                voice.gender,
                voice.preset_voice.as_deref().unwrap_or("none"),
                if voice.reference.is_some() { "yes" } else { "no" }
            ));
        }
        for segment in &state.segments {
            match segment.synthesis_tier {
                Some(tier) => ctx.logger.segment(
                    segment.index(),
                    &format!("{} tier {}", segment.speaker_id(), tier.letter()),
                ),
                None => ctx
                    .logger
                    .segment(segment.index(), &format!("{} no audio", segment.speaker_id())),
            }
        }
        ctx.logger.info(&format!("Synthesis: {}", report.summary()));
        save_intermediate(ctx, "synthesis.json", &report);

        let succeeded = report.succeeded();
        state.synthesis = Some(report);
        if succeeded == 0 {
            return Err(StepError::other(
                "every synthesis tier failed for every segment",
            ));
        }
        Ok(StepOutcome::Success)
    }

    fn validate_output(&self, _ctx: &Context, state: &JobState) -> StepResult<()> {
        if state.synthesis.is_none() {
            return Err(StepError::invalid_output("Synthesis not recorded"));
        }
        if !state.segments.iter().any(|s| s.is_synthesized()) {
            return Err(StepError::invalid_output("no segment has audio"));
        }
        Ok(())
    }
}
