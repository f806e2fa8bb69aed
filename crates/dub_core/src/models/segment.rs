//! Segment of speech on the source timeline.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::enums::SynthesisTier;

/// Shortest duration a segment may have, in seconds.
///
/// Degenerate intervals from the recognizer (`end <= start`) are widened to
/// this length so every segment occupies a real slot on the timeline.
pub const MIN_SEGMENT_SECS: f64 = 0.05;

/// Clamp `start` to zero and raise `end` to at least `start + MIN_SEGMENT_SECS`.
pub fn widened_bounds(start: f64, end: f64) -> (f64, f64) {
    let start = start.max(0.0);
    if end - start < MIN_SEGMENT_SECS {
        (start, start + MIN_SEGMENT_SECS)
    } else {
        (start, end)
    }
}

/// One unit of speech: who said what, and when.
///
/// The identity fields (`index`, `speaker_id`, `start`, `end`) are fixed once
/// the aligner has produced the segment and are only readable from outside
/// the crate. Later stages fill in the content fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    index: usize,
    speaker_id: String,
    start: f64,
    end: f64,
    /// Recognized text in the source language.
    pub source_text: String,
    /// Text in the target language (set by the translation step).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub translated_text: Option<String>,
    /// Synthesized clip for this segment (set by the synthesis step).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub synthesized_audio: Option<PathBuf>,
    /// Tier that produced `synthesized_audio`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub synthesis_tier: Option<SynthesisTier>,
}

impl Segment {
    /// Create a segment. `end` is raised to at least `start + MIN_SEGMENT_SECS`.
    pub fn new(
        index: usize,
        speaker_id: impl Into<String>,
        start: f64,
        end: f64,
        source_text: impl Into<String>,
    ) -> Self {
        let (start, end) = widened_bounds(start, end);

        Self {
            index,
            speaker_id: speaker_id.into(),
            start,
            end,
            source_text: source_text.into(),
            translated_text: None,
            synthesized_audio: None,
            synthesis_tier: None,
        }
    }

    /// Position of this segment in the aligned list.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Speaker label from diarization.
    pub fn speaker_id(&self) -> &str {
        &self.speaker_id
    }

    /// Start time on the source timeline, in seconds.
    pub fn start(&self) -> f64 {
        self.start
    }

    /// End time on the source timeline, in seconds.
    pub fn end(&self) -> f64 {
        self.end
    }

    /// Length of the original slot: `end - start`.
    pub fn target_duration(&self) -> f64 {
        self.end - self.start
    }

    /// Text to synthesize: the translation when present, else the source text.
    pub fn speech_text(&self) -> &str {
        self.translated_text.as_deref().unwrap_or(&self.source_text)
    }

    /// Path of the synthesized clip, if synthesis succeeded.
    pub fn audio_path(&self) -> Option<&Path> {
        self.synthesized_audio.as_deref()
    }

    /// Whether a clip is available for mixing.
    pub fn is_synthesized(&self) -> bool {
        self.synthesized_audio.is_some()
    }

    /// Record a successful synthesis.
    pub fn set_synthesized(&mut self, path: PathBuf, tier: SynthesisTier) {
        self.synthesized_audio = Some(path);
        self.synthesis_tier = Some(tier);
    }

    /// Drop the synthesized clip (every tier failed or the clip is unusable).
    pub fn clear_synthesized(&mut self) {
        self.synthesized_audio = None;
        self.synthesis_tier = None;
    }

    /// Renumber after a merge pass.
    pub(crate) fn set_index(&mut self, index: usize) {
        self.index = index;
    }

    /// Absorb the following same-speaker segment.
    ///
    /// Texts are joined with one space and the end only ever moves later.
    pub(crate) fn absorb(&mut self, next: &Segment) {
        let next_text = next.source_text.trim();
        if !next_text.is_empty() {
            if self.source_text.trim().is_empty() {
                self.source_text = next_text.to_string();
            } else {
                self.source_text = format!("{} {}", self.source_text.trim_end(), next_text);
            }
        }
        self.end = self.end.max(next.end);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn degenerate_interval_is_widened() {
        let seg = Segment::new(0, "S1", 2.0, 2.0, "hi");
        assert!(seg.end() > seg.start());
        assert!((seg.target_duration() - MIN_SEGMENT_SECS).abs() < 1e-9);

        let reversed = Segment::new(0, "S1", 3.0, 1.0, "hi");
        assert!(reversed.end() > reversed.start());
    }

    #[test]
    fn speech_text_prefers_translation() {
        let mut seg = Segment::new(0, "S1", 0.0, 1.0, "hello");
        assert_eq!(seg.speech_text(), "hello");
        seg.translated_text = Some("hola".to_string());
        assert_eq!(seg.speech_text(), "hola");
    }

    #[test]
    fn absorb_joins_text_and_extends_end() {
        let mut a = Segment::new(0, "S1", 0.0, 1.0, "hello");
        let b = Segment::new(1, "S1", 1.2, 2.0, " world ");
        a.absorb(&b);
        assert_eq!(a.source_text, "hello world");
        assert_eq!(a.end(), 2.0);

        // A contained segment never shortens the end
        let c = Segment::new(2, "S1", 0.5, 1.5, "again");
        a.absorb(&c);
        assert_eq!(a.end(), 2.0);
    }

    #[test]
    fn synthesized_state_round_trips() {
        let mut seg = Segment::new(0, "S1", 0.0, 1.0, "x");
        seg.set_synthesized(PathBuf::from("/tmp/a.wav"), SynthesisTier::Basic);
        assert!(seg.is_synthesized());
        seg.clear_synthesized();
        assert!(seg.synthesis_tier.is_none());
    }
}
