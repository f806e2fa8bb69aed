//! AlignTiming step - fit each synthesized clip to its source slot.

use crate::engines::EngineSet;
use crate::models::JobStage;
use crate::orchestrator::errors::{StepError, StepResult};
use crate::orchestrator::step::PipelineStep;
use crate::orchestrator::types::{Context, JobState, StepOutcome};
use crate::timing::{align_segment_timing, TimingConfig};

pub struct AlignTimingStep;

impl AlignTimingStep {
    pub fn new() -> Self {
        Self
    }
}

impl Default for AlignTimingStep {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineStep for AlignTimingStep {
    fn name(&self) -> &str {
        "AlignTiming"
    }

    fn stage(&self) -> JobStage {
        JobStage::Synthesizing
    }

    fn description(&self) -> &str {
        "Fit clips to source timing"
    }

    fn validate_input(&self, _ctx: &Context, state: &JobState) -> StepResult<()> {
        if state.synthesis.is_none() {
            return Err(StepError::precondition_failed(
                "AlignTiming needs clips from Synthesize",
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
        let config = TimingConfig::from(&ctx.settings.timing);
        ctx.logger.info(&format!(
            "Aligning clips ({} mode, speed {:.2}-{:.2})",
            config.mode, config.min_speed, config.max_speed
        ));

        let report = align_segment_timing(&mut state.segments, ctx.sample_rate(), &config);
        ctx.logger.info(&format!(
            "{} clips checked, {} re-timed, {} trimmed, {} unusable",
            report.clips.len(),
            report.adjusted(),
            report.trimmed(),
            report.unreadable.len()
        ));

        state.timing = Some(report);
        Ok(StepOutcome::Success)
    }

    fn validate_output(&self, _ctx: &Context, state: &JobState) -> StepResult<()> {
        if !state.segments.iter().any(|s| s.is_synthesized()) {
            return Err(StepError::invalid_output("no usable clip left after timing"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::{read_wav, write_wav};
    use crate::engines::mock::tone;
    use crate::models::{Segment, SynthesisTier};
    use crate::orchestrator::fixtures::{test_context, test_engines, RATE};
    use crate::synthesis::BatchReport;
    use tempfile::tempdir;

    #[test]
    fn long_clip_is_fit_into_slot() {
        let dir = tempdir().unwrap();
        let ctx = test_context(dir.path());
        let clip = dir.path().join("seg.wav");
        write_wav(&clip, &tone(200.0, 3.0, RATE)).unwrap();

        let mut state = JobState::new("job");
        let mut segment = Segment::new(0, "S1", 0.0, 2.5, "x");
        segment.set_synthesized(clip, SynthesisTier::Basic);
        state.segments = vec![segment];
        state.synthesis = Some(BatchReport::default());

        let step = AlignTimingStep::new();
        step.execute(&ctx, &mut test_engines(), &mut state).unwrap();
        step.validate_output(&ctx, &state).unwrap();

        let timing = state.timing.as_ref().unwrap();
        assert!((timing.clips[0].speed_factor - 1.2).abs() < 1e-9);
        let aligned = read_wav(state.segments[0].audio_path().unwrap()).unwrap();
        assert!((aligned.duration_secs() - 2.5).abs() < 1e-3);
    }
}
