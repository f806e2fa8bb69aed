//! Speaker/transcript alignment.
//!
//! Diarization says who spoke when; recognition says what was said when.
//! The two timelines come from different engines and rarely agree on
//! boundaries. This module attaches a speaker to every recognized interval
//! by maximum overlap and then merges same-speaker runs separated by short
//! pauses.

mod assign;
mod merge;

pub use assign::{assign_speaker, overlap, whole_track_turn};
pub use merge::merge_segments;

use crate::config::AlignmentSettings;
use crate::engines::{SpeakerTurn, TranscriptSegment};
use crate::models::{widened_bounds, Segment};

/// Configuration for the aligner.
#[derive(Debug, Clone)]
pub struct AlignerConfig {
    /// Same-speaker segments closer than this merge (seconds).
    pub merge_gap_secs: f64,
    /// Speaker used when no diarization turn exists.
    pub default_speaker: String,
}

impl Default for AlignerConfig {
    fn default() -> Self {
        Self {
            merge_gap_secs: 0.5,
            default_speaker: "S1".to_string(),
        }
    }
}

impl From<&AlignmentSettings> for AlignerConfig {
    fn from(settings: &AlignmentSettings) -> Self {
        let default_speaker = if settings.default_speaker.trim().is_empty() {
            "S1".to_string()
        } else {
            settings.default_speaker.trim().to_string()
        };
        Self {
            merge_gap_secs: settings.merge_gap_secs.max(0.0),
            default_speaker,
        }
    }
}

/// Build the aligned, merged segment list.
///
/// One segment per recognized interval, sorted by start. Every segment has
/// `end > start` and a non-empty speaker id.
pub fn align_segments(
    turns: &[SpeakerTurn],
    transcript: &[TranscriptSegment],
    config: &AlignerConfig,
) -> Vec<Segment> {
    // Earliest first; stable sort keeps input order for equal starts
    let mut ordered: Vec<&SpeakerTurn> = turns
        .iter()
        .filter(|t| !t.speaker_id.trim().is_empty())
        .collect();
    ordered.sort_by(|a, b| a.start.total_cmp(&b.start));

    let fallback = ordered
        .first()
        .map(|t| t.speaker_id.as_str())
        .unwrap_or(config.default_speaker.as_str());

    let mut intervals: Vec<&TranscriptSegment> = transcript.iter().collect();
    intervals.sort_by(|a, b| a.start.total_cmp(&b.start));

    let segments = intervals
        .into_iter()
        .enumerate()
        .map(|(index, interval)| {
            let (start, end) = widened_bounds(interval.start, interval.end);
            let speaker = assign_speaker(&ordered, start, end).unwrap_or(fallback);
            Segment::new(index, speaker, start, end, interval.text.trim())
        })
        .collect();

    merge_segments(segments, config.merge_gap_secs)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn turn(id: &str, start: f64, end: f64) -> SpeakerTurn {
        SpeakerTurn::new(id, start, end)
    }

    fn text(start: f64, end: f64, t: &str) -> TranscriptSegment {
        TranscriptSegment::new(start, end, t)
    }

    #[test]
    fn tie_goes_to_earliest_turn() {
        let turns = vec![turn("S2", 3.0, 5.0), turn("S1", 0.0, 3.0)];
        let segments = align_segments(&turns, &[text(2.0, 4.0, "hello")], &AlignerConfig::default());
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].speaker_id(), "S1");
    }

    #[test]
    fn largest_overlap_wins() {
        let turns = vec![turn("A", 0.0, 2.5), turn("B", 2.5, 10.0)];
        let segments = align_segments(&turns, &[text(2.0, 4.0, "x")], &AlignerConfig::default());
        assert_eq!(segments[0].speaker_id(), "B");
    }

    #[test]
    fn no_overlap_uses_first_known_speaker() {
        let turns = vec![turn("B", 5.0, 6.0), turn("A", 3.0, 4.0)];
        let segments = align_segments(&turns, &[text(0.0, 1.0, "x")], &AlignerConfig::default());
        assert_eq!(segments[0].speaker_id(), "A");
    }

    #[test]
    fn no_turns_uses_default_speaker() {
        let segments = align_segments(&[], &[text(0.0, 1.0, "x")], &AlignerConfig::default());
        assert_eq!(segments[0].speaker_id(), "S1");
    }

    #[test]
    fn every_segment_is_well_formed() {
        let turns = vec![turn("S1", 0.0, 10.0)];
        let transcript = vec![
            text(4.0, 4.0, "point"),
            text(1.0, 0.5, "reversed"),
            text(-1.0, 0.2, "negative"),
        ];
        let config = AlignerConfig {
            merge_gap_secs: 0.0,
            ..Default::default()
        };
        let segments = align_segments(&turns, &transcript, &config);

        assert!(!segments.is_empty());
        for seg in &segments {
            assert!(seg.end() > seg.start());
            assert!(!seg.speaker_id().is_empty());
        }
        for pair in segments.windows(2) {
            assert!(pair[0].start() <= pair[1].start());
        }
    }

    #[test]
    fn empty_transcript_is_empty() {
        let segments = align_segments(&[turn("S1", 0.0, 1.0)], &[], &AlignerConfig::default());
        assert!(segments.is_empty());
    }

    #[test]
    fn close_same_speaker_segments_merge() {
        let turns = vec![turn("S1", 0.0, 5.0), turn("S2", 5.0, 9.0)];
        let transcript = vec![
            text(0.0, 1.0, "one"),
            text(1.3, 2.0, "two"),
            text(3.0, 4.0, "three"),
            text(5.2, 6.0, "four"),
        ];
        let segments = align_segments(&turns, &transcript, &AlignerConfig::default());

        assert_eq!(segments.len(), 3);
        assert_eq!(segments[0].source_text, "one two");
        assert_eq!(segments[0].end(), 2.0);
        assert_eq!(segments[1].source_text, "three");
        assert_eq!(segments[2].speaker_id(), "S2");
        let indices: Vec<usize> = segments.iter().map(|s| s.index()).collect();
        assert_eq!(indices, vec![0, 1, 2]);
    }
}
