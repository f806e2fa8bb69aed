//! Extract step - decodes the input to a mono PCM WAV.
//!
//! Everything downstream works on this file: recognition, diarization,
//! reference slicing and the optional background bed.

use std::fs;

use crate::audio::read_wav;
use crate::engines::EngineSet;
use crate::models::JobStage;
use crate::orchestrator::errors::{StepError, StepResult};
use crate::orchestrator::step::PipelineStep;
use crate::orchestrator::types::{Context, ExtractOutput, JobState, StepOutcome};

/// Decoded audio file name inside the work directory.
const SOURCE_WAV: &str = "source.wav";

pub struct ExtractStep;

impl ExtractStep {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ExtractStep {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineStep for ExtractStep {
    fn name(&self) -> &str {
        "Extract"
    }

    fn stage(&self) -> JobStage {
        JobStage::Transcribing
    }

    fn description(&self) -> &str {
        "Decode input audio"
    }

    fn validate_input(&self, ctx: &Context, _state: &JobState) -> StepResult<()> {
        if !ctx.request.input_path.is_file() {
            return Err(StepError::file_not_found(
                ctx.request.input_path.display().to_string(),
            ));
        }
        Ok(())
    }

    fn execute(
        &self,
        ctx: &Context,
        engines: &mut EngineSet,
        state: &mut JobState,
    ) -> StepResult<StepOutcome> {
        fs::create_dir_all(&ctx.work_dir)
            .map_err(|e| StepError::io_error("creating work directory", e))?;

        let output = ctx.work_dir.join(SOURCE_WAV);
        let sample_rate = ctx.sample_rate();
        let decoder = engines.decoder.name().to_string();

        ctx.logger.info(&format!(
            "Decoding {} with {} ({} Hz mono)",
            ctx.request.input_path.display(),
            decoder,
            sample_rate
        ));
        engines
            .decoder
            .decode(&ctx.request.input_path, &output, sample_rate)
            .map_err(|e| StepError::engine(decoder, e))?;

        let audio = read_wav(&output)?;
        if audio.is_empty() {
            return Err(StepError::invalid_output("decoded audio is empty"));
        }
        let duration_secs = audio.duration_secs();
        ctx.logger
            .info(&format!("Decoded {:.2}s of audio", duration_secs));

        state.extract = Some(ExtractOutput {
            audio_path: output,
            duration_secs,
            sample_rate: audio.sample_rate,
        });

        Ok(StepOutcome::Success)
    }

    fn validate_output(&self, _ctx: &Context, state: &JobState) -> StepResult<()> {
        match &state.extract {
            Some(extract) if extract.audio_path.is_file() => Ok(()),
            Some(extract) => Err(StepError::file_not_found(
                extract.audio_path.display().to_string(),
            )),
            None => Err(StepError::invalid_output("Extraction not recorded")),
        }
    }
}
