//! The three synthesis tiers.

use std::path::PathBuf;

use super::{SynthesisStrategy, TierRequest};
use crate::engines::{EngineError, EngineResult, SynthesisRequest, SynthesizerHandle};
use crate::models::SynthesisTier;

/// Tier A: clone the speaker from their reference clip.
pub struct VoiceCloneTier {
    engine: SynthesizerHandle,
}

impl VoiceCloneTier {
    pub fn new(engine: SynthesizerHandle) -> Self {
        Self { engine }
    }
}

impl SynthesisStrategy for VoiceCloneTier {
    fn tier(&self) -> SynthesisTier {
        SynthesisTier::VoiceClone
    }

    fn applicable(&self, request: &TierRequest<'_>) -> bool {
        request.voice.reference.is_some()
    }

    fn attempt(&mut self, request: &TierRequest<'_>) -> EngineResult<PathBuf> {
        let reference = request
            .voice
            .reference
            .as_deref()
            .ok_or_else(|| EngineError::other("No reference clip for voice cloning"))?;

        self.engine.get()?.synthesize(&SynthesisRequest {
            text: request.text,
            language: request.language,
            reference: Some(reference),
            voice: None,
            output_path: request.output_path,
        })
    }
}

/// Tier B: preset voice chosen by language and estimated gender.
pub struct MatchedVoiceTier {
    engine: SynthesizerHandle,
}

impl MatchedVoiceTier {
    pub fn new(engine: SynthesizerHandle) -> Self {
        Self { engine }
    }
}

impl SynthesisStrategy for MatchedVoiceTier {
    fn tier(&self) -> SynthesisTier {
        SynthesisTier::MatchedVoice
    }

    fn attempt(&mut self, request: &TierRequest<'_>) -> EngineResult<PathBuf> {
        let preset = request.voice.preset_voice.as_deref().ok_or_else(|| {
            EngineError::UnsupportedLanguage {
                engine: self.engine.name().to_string(),
                language: request.language.to_string(),
            }
        })?;

        self.engine.get()?.synthesize(&SynthesisRequest {
            text: request.text,
            language: request.language,
            reference: None,
            voice: Some(preset),
            output_path: request.output_path,
        })
    }
}

/// Tier C: plain synthesis with no voice matching.
pub struct BasicTier {
    engine: SynthesizerHandle,
}

impl BasicTier {
    pub fn new(engine: SynthesizerHandle) -> Self {
        Self { engine }
    }
}

impl SynthesisStrategy for BasicTier {
    fn tier(&self) -> SynthesisTier {
        SynthesisTier::Basic
    }

    fn attempt(&mut self, request: &TierRequest<'_>) -> EngineResult<PathBuf> {
        self.engine.get()?.synthesize(&SynthesisRequest {
            text: request.text,
            language: request.language,
            reference: None,
            voice: None,
            output_path: request.output_path,
        })
    }
}
