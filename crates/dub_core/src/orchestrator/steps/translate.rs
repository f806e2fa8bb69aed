//! Translate step - per-segment translation, memoized within the job.

use std::collections::HashMap;

use serde::Serialize;

use crate::engines::EngineSet;
use crate::models::JobStage;
use crate::orchestrator::errors::{StepError, StepResult};
use crate::orchestrator::step::PipelineStep;
use crate::orchestrator::types::{Context, JobState, StepOutcome, TranslationOutput};

use super::save_intermediate;

#[derive(Serialize)]
struct TranslationRecord<'a> {
    index: usize,
    speaker_id: &'a str,
    source: &'a str,
    translated: &'a str,
}

pub struct TranslateStep;

impl TranslateStep {
    pub fn new() -> Self {
        Self
    }
}

impl Default for TranslateStep {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineStep for TranslateStep {
    fn name(&self) -> &str {
        "Translate"
    }

    fn stage(&self) -> JobStage {
        JobStage::Translating
    }

    fn description(&self) -> &str {
        "Translate segment text"
    }

    fn validate_input(&self, _ctx: &Context, state: &JobState) -> StepResult<()> {
        if !state.has_transcription() {
            return Err(StepError::precondition_failed(
                "Translate needs segments from Transcribe",
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
        if state.segments.is_empty() {
            return Ok(StepOutcome::Skipped("no speech segments".to_string()));
        }

        let source = state
            .transcription
            .as_ref()
            .map(|t| t.detected_language.clone())
            .ok_or_else(|| StepError::precondition_failed("source language unknown"))?;
        let target = ctx.target_lang();
        let engine = engines.translator.name().to_string();
        ctx.logger
            .info(&format!("Translating {} → {} with {}", source, target, engine));

        let mut cache: HashMap<String, String> = HashMap::new();
        let mut cache_hits = 0;

        let total = state.segments.len();
        for (done, segment) in state.segments.iter_mut().enumerate() {
            ctx.logger.progress((done * 100 / total) as u32);
            let text = segment.source_text.trim();
            if text.is_empty() {
                segment.translated_text = Some(String::new());
                continue;
            }

            if let Some(hit) = cache.get(text) {
                cache_hits += 1;
                segment.translated_text = Some(hit.clone());
                continue;
            }

            let translated = engines
                .translator
                .get()
                .and_then(|t| t.translate(text, &source, &target))
                .map_err(|e| StepError::engine(engine.as_str(), e))?;
            cache.insert(text.to_string(), translated.clone());
            segment.translated_text = Some(translated);
        }

        ctx.logger.progress(100);
        ctx.logger.info(&format!(
            "Translated {} segments ({} unique, {} cached)",
            state.segments.len(),
            cache.len(),
            cache_hits
        ));

        let records: Vec<TranslationRecord<'_>> = state
            .segments
            .iter()
            .map(|s| TranslationRecord {
                index: s.index(),
                speaker_id: s.speaker_id(),
                source: &s.source_text,
                translated: s.translated_text.as_deref().unwrap_or_default(),
            })
            .collect();
        save_intermediate(ctx, "translation.json", &records);

        state.translation = Some(TranslationOutput {
            translated: state.segments.len(),
            unique_texts: cache.len(),
            cache_hits,
        });
        Ok(StepOutcome::Success)
    }

    fn validate_output(&self, _ctx: &Context, state: &JobState) -> StepResult<()> {
        if state.segments.iter().any(|s| s.translated_text.is_none()) {
            return Err(StepError::invalid_output("segment left untranslated"));
        }
        Ok(())
    }
}
