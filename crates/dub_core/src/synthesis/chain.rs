//! Fallback runner and batch synthesis.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::tiers::{BasicTier, MatchedVoiceTier, VoiceCloneTier};
use super::voices::preset_voice;
use super::{SynthesisStrategy, TierRequest};
use crate::audio::{classify_gender, estimate_pitch, is_non_empty_file, read_wav};
use crate::config::SynthesisSettings;
use crate::engines::SynthesizerHandle;
use crate::models::{Gender, Segment, SynthesisTier};
use crate::references::{file_stem_for, SpeakerReferences};

/// Voice settings resolved once per speaker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeakerVoice {
    pub speaker_id: String,
    pub gender: Gender,
    /// Mean F0 of the reference clip, when one was measurable.
    pub mean_f0_hz: Option<f64>,
    /// Preset for the matched-voice tier, if the language has one.
    pub preset_voice: Option<String>,
    /// Reference clip for the voice-clone tier.
    pub reference: Option<PathBuf>,
}

/// What happened to one segment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SegmentOutcome {
    Synthesized { tier: SynthesisTier, path: PathBuf },
    Skipped { reason: String },
    Failed { errors: Vec<String> },
}

impl SegmentOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, SegmentOutcome::Synthesized { .. })
    }
}

/// Outcome of one segment in a batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentReport {
    pub index: usize,
    pub speaker_id: String,
    pub outcome: SegmentOutcome,
}

/// Result of [`SynthesisChain::batch_clone_voices`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchReport {
    pub segments: Vec<SegmentReport>,
    pub tier_counts: BTreeMap<SynthesisTier, usize>,
    pub voices: BTreeMap<String, SpeakerVoice>,
}

impl BatchReport {
    pub fn succeeded(&self) -> usize {
        self.segments.iter().filter(|s| s.outcome.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.segments
            .iter()
            .filter(|s| matches!(s.outcome, SegmentOutcome::Failed { .. }))
            .count()
    }

    pub fn skipped(&self) -> usize {
        self.segments
            .iter()
            .filter(|s| matches!(s.outcome, SegmentOutcome::Skipped { .. }))
            .count()
    }

    /// Segments produced by `tier`.
    pub fn count(&self, tier: SynthesisTier) -> usize {
        self.tier_counts.get(&tier).copied().unwrap_or(0)
    }

    /// One-line summary for logs, e.g. `A=3 B=1 C=0, 1 failed, 0 skipped`.
    pub fn summary(&self) -> String {
        let tiers: Vec<String> = SynthesisTier::ALL
            .iter()
            .map(|t| format!("{}={}", t.letter(), self.count(*t)))
            .collect();
        format!(
            "{}, {} failed, {} skipped",
            tiers.join(" "),
            self.failed(),
            self.skipped()
        )
    }
}

/// Ordered list of synthesis strategies.
pub struct SynthesisChain {
    strategies: Vec<Box<dyn SynthesisStrategy>>,
    gender_threshold_hz: f64,
}

impl SynthesisChain {
    /// Chain over the given strategies, tried in order.
    pub fn new(strategies: Vec<Box<dyn SynthesisStrategy>>, gender_threshold_hz: f64) -> Self {
        Self {
            strategies,
            gender_threshold_hz,
        }
    }

    /// The A → B → C chain, minus tiers disabled in settings.
    pub fn standard(
        settings: &SynthesisSettings,
        voice_clone: SynthesizerHandle,
        neural_voice: SynthesizerHandle,
        basic_voice: SynthesizerHandle,
    ) -> Self {
        let mut strategies: Vec<Box<dyn SynthesisStrategy>> = Vec::with_capacity(3);
        if settings.enable_voice_clone {
            strategies.push(Box::new(VoiceCloneTier::new(voice_clone)));
        }
        if settings.enable_matched_voice {
            strategies.push(Box::new(MatchedVoiceTier::new(neural_voice)));
        }
        strategies.push(Box::new(BasicTier::new(basic_voice)));

        Self::new(strategies, settings.gender_threshold_hz)
    }

    /// Tiers in the order they are tried.
    pub fn tiers(&self) -> Vec<SynthesisTier> {
        self.strategies.iter().map(|s| s.tier()).collect()
    }

    /// Estimate gender from the reference and pick a preset voice.
    ///
    /// No reference, an unreadable one, or no voiced frames all mean male.
    pub fn resolve_voice(
        &self,
        speaker_id: &str,
        reference: Option<&Path>,
        language: &str,
    ) -> SpeakerVoice {
        let estimate = reference.and_then(|path| match read_wav(path) {
            Ok(audio) => estimate_pitch(&audio),
            Err(e) => {
                tracing::warn!("Could not read reference for {}: {}", speaker_id, e);
                None
            }
        });
        let gender = classify_gender(estimate, self.gender_threshold_hz);

        SpeakerVoice {
            speaker_id: speaker_id.to_string(),
            gender,
            mean_f0_hz: estimate.map(|e| e.mean_f0_hz),
            preset_voice: preset_voice(language, gender).map(str::to_string),
            reference: reference.map(Path::to_path_buf),
        }
    }

    /// Try each tier once, in order, until one produces a usable file.
    pub fn synthesize(
        &mut self,
        text: &str,
        language: &str,
        voice: &SpeakerVoice,
        output_path: &Path,
    ) -> SegmentOutcome {
        if text.trim().is_empty() {
            return SegmentOutcome::Skipped {
                reason: "blank text".to_string(),
            };
        }

        let request = TierRequest {
            text: text.trim(),
            language,
            voice,
            output_path,
        };
        let mut errors = Vec::new();

        for strategy in self.strategies.iter_mut() {
            let tier = strategy.tier();
            if !strategy.applicable(&request) {
                tracing::debug!("Tier {} not applicable for {}", tier.letter(), voice.speaker_id);
                continue;
            }

            // Each tier must produce its own file, not inherit a failed one's
            if let Err(e) = clear_output(output_path) {
                errors.push(format!("{}: {}", tier.letter(), e));
                continue;
            }

            let error = match strategy.attempt(&request) {
                Ok(path) if is_non_empty_file(&path) => {
                    return SegmentOutcome::Synthesized { tier, path };
                }
                Ok(path) => format!("{}: produced no audio at {}", tier.letter(), path.display()),
                Err(e) => format!("{}: {}", tier.letter(), e),
            };
            tracing::debug!("Tier failed for {}: {}", voice.speaker_id, error);
            errors.push(error);
        }

        if errors.is_empty() {
            errors.push("no synthesis tier applicable".to_string());
        }
        SegmentOutcome::Failed { errors }
    }

    /// Synthesize every segment into `output_dir`.
    ///
    /// Segments are independent: a failure leaves that segment without
    /// audio and the batch continues. Voices are resolved once per
    /// speaker for the whole batch.
    pub fn batch_clone_voices(
        &mut self,
        segments: &mut [Segment],
        references: &SpeakerReferences,
        language: &str,
        output_dir: &Path,
    ) -> BatchReport {
        let mut report = BatchReport::default();

        for segment in segments.iter_mut() {
            let speaker_id = segment.speaker_id().to_string();
            if !report.voices.contains_key(&speaker_id) {
                let voice =
                    self.resolve_voice(&speaker_id, references.path_for(&speaker_id), language);
                tracing::debug!(
                    "Voice for {}: {} ({})",
                    speaker_id,
                    voice.gender,
                    voice.preset_voice.as_deref().unwrap_or("no preset")
                );
                report.voices.insert(speaker_id.clone(), voice);
            }
            let Some(voice) = report.voices.get(&speaker_id) else {
                continue;
            };

            let output_path = output_dir.join(format!(
                "seg_{:04}_{}.wav",
                segment.index(),
                file_stem_for(&speaker_id)
            ));
            let text = segment.speech_text().to_string();
            let outcome = self.synthesize(&text, language, voice, &output_path);

            match &outcome {
                SegmentOutcome::Synthesized { tier, path } => {
                    segment.set_synthesized(path.clone(), *tier);
                    *report.tier_counts.entry(*tier).or_insert(0) += 1;
                }
                SegmentOutcome::Skipped { .. } | SegmentOutcome::Failed { .. } => {
                    segment.clear_synthesized();
                }
            }

            if let SegmentOutcome::Failed { errors } = &outcome {
                tracing::warn!(
                    "Segment {} ({}): all tiers failed: {}",
                    segment.index(),
                    speaker_id,
                    errors.join("; ")
                );
            }

            report.segments.push(SegmentReport {
                index: segment.index(),
                speaker_id,
                outcome,
            });
        }

        report
    }
}

fn clear_output(path: &Path) -> std::io::Result<()> {
    match fs::remove_file(path) {
        Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e),
        _ => Ok(()),
    }
}
