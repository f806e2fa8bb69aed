//! Clip selection and reference assembly.

use std::collections::BTreeMap;
use std::path::Path;

use super::{ReferenceConfig, SpeakerReference, SpeakerReferences};
use crate::audio::{write_wav, AudioData, AudioResult};
use crate::models::Segment;

/// A span of the source timeline chosen for a reference.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClipSpan {
    pub start: f64,
    pub end: f64,
}

impl ClipSpan {
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

/// Choose the spans that make up one speaker's reference.
///
/// Longest segments first. Up to `max_clips` segments of at least
/// `min_clip_secs` are taken until `target_secs` is collected; the sum
/// never exceeds `max_total_secs` (the last clip is truncated). When no
/// segment is long enough the single longest one is used.
pub fn select_clips(segments: &[&Segment], config: &ReferenceConfig) -> Vec<ClipSpan> {
    let mut by_length: Vec<&Segment> = segments.to_vec();
    by_length.sort_by(|a, b| {
        b.target_duration()
            .total_cmp(&a.target_duration())
            .then(a.start().total_cmp(&b.start()))
    });

    let eligible: Vec<&Segment> = by_length
        .iter()
        .copied()
        .filter(|s| s.target_duration() >= config.min_clip_secs)
        .collect();

    let candidates = if eligible.is_empty() {
        by_length.into_iter().take(1).collect::<Vec<_>>()
    } else {
        eligible
    };

    let mut spans = Vec::new();
    let mut total = 0.0;

    for segment in candidates {
        if spans.len() >= config.max_clips || total >= config.target_secs {
            break;
        }
        let remaining = config.max_total_secs - total;
        if remaining <= 0.0 {
            break;
        }
        let duration = segment.target_duration().min(remaining);
        spans.push(ClipSpan {
            start: segment.start(),
            end: segment.start() + duration,
        });
        total += duration;
    }

    spans
}

/// Build and write a reference clip for every speaker.
///
/// Files land in `refs_dir` as `<nn>_<speaker>_reference.wav`. Speakers whose
/// spans yield no samples (e.g. past the end of the decoded audio) are
/// left out of the map.
pub fn build_references(
    source: &AudioData,
    segments: &[Segment],
    refs_dir: &Path,
    config: &ReferenceConfig,
) -> AudioResult<SpeakerReferences> {
    let mut by_speaker: BTreeMap<&str, Vec<&Segment>> = BTreeMap::new();
    for segment in segments {
        by_speaker
            .entry(segment.speaker_id())
            .or_default()
            .push(segment);
    }

    let gap = AudioData::silence(config.clip_gap_secs, source.sample_rate);
    let mut references = SpeakerReferences::new();

    for (ordinal, (speaker_id, speaker_segments)) in by_speaker.into_iter().enumerate() {
        let spans = select_clips(&speaker_segments, config);

        let mut joined = AudioData::new(Vec::new(), source.sample_rate);
        let mut clip_count = 0;
        for span in &spans {
            let clip = source.slice_secs(span.start, span.end);
            if clip.is_empty() {
                continue;
            }
            if clip_count > 0 {
                joined.append(&gap);
            }
            joined.append(&clip);
            clip_count += 1;
        }

        if clip_count == 0 {
            tracing::warn!(
                "No usable audio for speaker {}; voice cloning disabled for them",
                speaker_id
            );
            continue;
        }

        // The ordinal keeps ids that sanitize alike ("a b", "a_b") apart
        let path = refs_dir.join(format!(
            "{:02}_{}_reference.wav",
            ordinal,
            file_stem_for(speaker_id)
        ));
        write_wav(&path, &joined)?;

        tracing::debug!(
            "Reference for {}: {} clip(s), {:.2}s",
            speaker_id,
            clip_count,
            joined.duration_secs()
        );

        references.insert(SpeakerReference {
            speaker_id: speaker_id.to_string(),
            path,
            duration_secs: joined.duration_secs(),
            clip_count,
        });
    }

    Ok(references)
}

/// Speaker ids come from external engines; keep them filesystem-safe.
pub(crate) fn file_stem_for(speaker_id: &str) -> String {
    speaker_id
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}
