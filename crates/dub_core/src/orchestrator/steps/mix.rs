//! Mix step - place every clip on the master track and write it.

use std::fs;

use crate::audio::{is_non_empty_file, read_wav};
use crate::engines::EngineSet;
use crate::mixer::{mix_segments, MixerConfig};
use crate::models::JobStage;
use crate::orchestrator::errors::{StepError, StepResult};
use crate::orchestrator::step::PipelineStep;
use crate::orchestrator::types::{Context, JobState, MixOutput, StepOutcome};

use super::require_extract;

pub struct MixStep;

impl MixStep {
    pub fn new() -> Self {
        Self
    }
}

impl Default for MixStep {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineStep for MixStep {
    fn name(&self) -> &str {
        "Mix"
    }

    fn stage(&self) -> JobStage {
        JobStage::Mixing
    }

    fn description(&self) -> &str {
        "Mix dubbed track"
    }

    fn validate_input(&self, _ctx: &Context, state: &JobState) -> StepResult<()> {
        require_extract(state, self.name())?;
        if !state.segments.iter().any(|s| s.is_synthesized()) {
            return Err(StepError::precondition_failed("no synthesized clips to mix"));
        }
        Ok(())
    }

    fn execute(
        &self,
        ctx: &Context,
        _engines: &mut EngineSet,
        state: &mut JobState,
    ) -> StepResult<StepOutcome> {
        let extract = require_extract(state, self.name())?;
        let config = MixerConfig::from(&ctx.settings.mixer);
        let output_path = ctx.output_path();
        if let Some(parent) = output_path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| StepError::io_error("creating output directory", e))?;
        }

        let original = if config.preserve_background {
            Some(read_wav(&extract.audio_path)?)
        } else {
            None
        };

        ctx.logger.info(&format!(
            "Mixing {} segments ({} policy) into {}",
            state.segments.len(),
            config.policy,
            output_path.display()
        ));
        let report = mix_segments(
            &state.segments,
            ctx.sample_rate(),
            Some(extract.duration_secs),
            original.as_ref(),
            &output_path,
            &config,
        )?;

        if report.placements.is_empty() {
            return Err(StepError::other("no clip could be placed on the timeline"));
        }
        if report.truncated() > 0 {
            ctx.logger
                .warn(&format!("{} clip(s) truncated to their slot", report.truncated()));
        }
        if report.max_shift_secs() > 0.0 {
            ctx.logger.info(&format!(
                "Sequential placement shifted clips by up to {:.2}s",
                report.max_shift_secs()
            ));
        }
        ctx.logger.info(&format!(
            "Output: {:.2}s, {} placed, {} silent",
            report.total_duration,
            report.placements.len(),
            report.skipped.len()
        ));

        state.mix = Some(MixOutput {
            output_path,
            report,
        });
        Ok(StepOutcome::Success)
    }

    fn validate_output(&self, _ctx: &Context, state: &JobState) -> StepResult<()> {
        match &state.mix {
            Some(mix) if is_non_empty_file(&mix.output_path) => Ok(()),
            Some(mix) => Err(StepError::invalid_output(format!(
                "output file missing or empty: {}",
                mix.output_path.display()
            ))),
            None => Err(StepError::invalid_output("Mix not recorded")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::write_wav;
    use crate::engines::mock::tone;
    use crate::models::{MixPolicy, Segment, SynthesisTier};
    use crate::orchestrator::fixtures::{test_context, test_engines, RATE};
    use crate::orchestrator::types::ExtractOutput;
    use tempfile::tempdir;

    fn mix_ready(dir: &std::path::Path) -> JobState {
        let source = dir.join("source.wav");
        write_wav(&source, &tone(100.0, 4.0, RATE)).unwrap();
        let clip = dir.join("clip.wav");
        write_wav(&clip, &tone(200.0, 1.0, RATE)).unwrap();

        let mut state = JobState::new("job");
        state.extract = Some(ExtractOutput {
            audio_path: source,
            duration_secs: 4.0,
            sample_rate: RATE,
        });
        let mut segment = Segment::new(0, "S1", 1.0, 2.0, "x");
        segment.set_synthesized(clip, SynthesisTier::Basic);
        state.segments = vec![segment, Segment::new(1, "S1", 2.5, 3.0, "y")];
        state
    }

    #[test]
    fn writes_default_output_name() {
        let dir = tempdir().unwrap();
        let ctx = test_context(dir.path());
        let mut state = mix_ready(dir.path());

        let step = MixStep::new();
        step.validate_input(&ctx, &state).unwrap();
        step.execute(&ctx, &mut test_engines(), &mut state).unwrap();
        step.validate_output(&ctx, &state).unwrap();

        let mix = state.mix.unwrap();
        assert_eq!(mix.output_path, dir.path().join("out").join("dubbed_test_job_es.wav"));
        assert_eq!(mix.report.policy, MixPolicy::FixedSlot);
        assert_eq!(mix.report.skipped, vec![1]);
        assert!((mix.report.total_duration - 4.0).abs() < 1e-3);
    }

    #[test]
    fn nothing_to_mix_fails_precondition() {
        let dir = tempdir().unwrap();
        let ctx = test_context(dir.path());
        let mut state = mix_ready(dir.path());
        state.segments[0].clear_synthesized();

        assert!(MixStep::new().validate_input(&ctx, &state).is_err());
    }
}
