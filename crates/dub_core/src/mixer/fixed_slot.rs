//! Fixed-slot placement.

use super::{Placement, TimelineClip};
use crate::audio::{ms_to_samples, secs_to_samples, AudioData};

/// Overlay each clip at its start, truncated to its slot.
///
/// The track is exactly `total_secs` long. Clips shorter than their slot
/// leave trailing silence.
pub fn mix_fixed_slot(
    clips: &[TimelineClip],
    total_secs: f64,
    sample_rate: u32,
) -> (AudioData, Vec<Placement>) {
    let rate = sample_rate as f64;
    let mut track = AudioData::silence(total_secs, sample_rate);
    let mut placements = Vec::with_capacity(clips.len());

    for clip in clips {
        let offset = ms_to_samples((clip.start * 1000.0).round() as u64, sample_rate);
        let slot_len = secs_to_samples(clip.end - clip.start, sample_rate);
        let usable = clip.audio.len().min(slot_len);

        let written = track.overlay_at(&clip.audio.samples[..usable], offset);
        let dropped = clip.audio.len() - written;
        let truncated_secs = dropped as f64 / rate;

        if dropped > 0 {
            tracing::warn!(
                "Segment {}: {:.2}s of audio truncated to fit its slot",
                clip.index,
                truncated_secs
            );
        }

        placements.push(Placement {
            index: clip.index,
            requested_start: clip.start,
            actual_start: offset as f64 / rate,
            duration: written as f64 / rate,
            truncated_secs,
        });
    }

    (track, placements)
}
