//! Transcribe step - recognition, diarization and segment alignment.
//!
//! Diarization is best-effort: if it fails or finds nobody, the whole
//! track is attributed to a single default speaker and the job goes on.

use std::collections::BTreeSet;

use crate::alignment::{align_segments, whole_track_turn, AlignerConfig};
use crate::engines::{EngineSet, SpeakerTurn};
use crate::models::language::normalize_code;
use crate::models::{JobStage, ValidationError};
use crate::orchestrator::errors::{StepError, StepResult};
use crate::orchestrator::step::PipelineStep;
use crate::orchestrator::types::{Context, JobState, StepOutcome, TranscriptionOutput};

use super::{require_extract, save_intermediate};

pub struct TranscribeStep;

impl TranscribeStep {
    pub fn new() -> Self {
        Self
    }

    /// Speaker turns, or a single whole-track turn when diarization fails.
    fn speaker_turns(
        &self,
        ctx: &Context,
        engines: &mut EngineSet,
        audio: &std::path::Path,
        duration_secs: f64,
        default_speaker: &str,
    ) -> (Vec<SpeakerTurn>, bool) {
        let turns = engines.diarizer.get().and_then(|d| d.diarize(audio));
        match turns {
            Ok(turns) if turns.iter().any(|t| !t.speaker_id.trim().is_empty()) => (turns, false),
            Ok(_) => {
                ctx.logger.warn(&format!(
                    "Diarization found no speakers; using single speaker {}",
                    default_speaker
                ));
                (vec![whole_track_turn(default_speaker, duration_secs)], true)
            }
            Err(e) => {
                ctx.logger.warn(&format!(
                    "Diarization failed ({}); using single speaker {}",
                    e, default_speaker
                ));
                (vec![whole_track_turn(default_speaker, duration_secs)], true)
            }
        }
    }
}

impl Default for TranscribeStep {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineStep for TranscribeStep {
    fn name(&self) -> &str {
        "Transcribe"
    }

    fn stage(&self) -> JobStage {
        JobStage::Transcribing
    }

    fn description(&self) -> &str {
        "Transcribe and attribute speakers"
    }

    fn validate_input(&self, _ctx: &Context, state: &JobState) -> StepResult<()> {
        require_extract(state, self.name()).map(|_| ())
    }

    fn execute(
        &self,
        ctx: &Context,
        engines: &mut EngineSet,
        state: &mut JobState,
    ) -> StepResult<StepOutcome> {
        let extract = require_extract(state, self.name())?.clone();
        let hint = ctx.request.source_hint();
        let target = ctx.target_lang();

        let engine = engines.transcriber.name().to_string();
        ctx.logger.info(&format!(
            "Transcribing with {} (language: {})",
            engine,
            hint.as_deref().unwrap_or("auto")
        ));
        let transcript = engines
            .transcriber
            .get()
            .and_then(|t| t.transcribe(&extract.audio_path, hint.as_deref()))
            .map_err(|e| StepError::engine(engine, e))?;

        let detected = match &hint {
            Some(code) => code.clone(),
            None => {
                let detected = transcript
                    .language
                    .as_deref()
                    .map(normalize_code)
                    .filter(|code| !code.is_empty())
                    .ok_or_else(|| {
                        StepError::invalid_output("recognizer did not report a language")
                    })?;
                ctx.logger
                    .info(&format!("Detected source language: {}", detected));
                if detected == target {
                    return Err(ValidationError::SameLanguage(detected).into());
                }
                detected
            }
        };

        let config = AlignerConfig::from(&ctx.settings.alignment);
        let (turns, fallback) = self.speaker_turns(
            ctx,
            engines,
            &extract.audio_path,
            extract.duration_secs,
            &config.default_speaker,
        );

        let segments = align_segments(&turns, &transcript.segments, &config);
        let speakers: Vec<String> = segments
            .iter()
            .map(|s| s.speaker_id().to_string())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        if segments.is_empty() {
            ctx.logger.warn("Recognizer returned no speech");
        }
        ctx.logger.info(&format!(
            "{} segments from {} transcript pieces, {} speaker(s)",
            segments.len(),
            transcript.segments.len(),
            speakers.len()
        ));
        ctx.logger.json("Segments", &segments);

        state.transcription = Some(TranscriptionOutput {
            detected_language: detected,
            speakers,
            diarization_fallback: fallback,
            segment_count: segments.len(),
        });
        state.segments = segments;
        save_intermediate(ctx, "transcription.json", &state.segments);

        Ok(StepOutcome::Success)
    }

    fn validate_output(&self, _ctx: &Context, state: &JobState) -> StepResult<()> {
        if !state.has_transcription() {
            return Err(StepError::invalid_output("Transcription not recorded"));
        }
        let malformed = state
            .segments
            .iter()
            .any(|s| s.end() <= s.start() || s.speaker_id().is_empty());
        if malformed {
            return Err(StepError::invalid_output("aligned segment without speaker or duration"));
        }
        Ok(())
    }
}
