//! Collision-avoiding sequential placement.

use super::{Placement, TimelineClip};
use crate::audio::{ms_to_samples, secs_to_samples, AudioData};

/// Append clips in start order, never overlapping.
///
/// Each clip starts at `max(start, end_of_previous + buffer)`; no buffer
/// is added while the track is still empty. When `source_duration` is
/// given and the track is shorter, trailing silence pads it.
pub fn mix_sequential(
    clips: &[TimelineClip],
    buffer_ms: u64,
    sample_rate: u32,
    source_duration: Option<f64>,
) -> (AudioData, Vec<Placement>) {
    let rate = sample_rate as f64;
    let buffer = ms_to_samples(buffer_ms, sample_rate);
    let mut track = AudioData::new(Vec::new(), sample_rate);
    let mut placements = Vec::with_capacity(clips.len());

    for clip in clips {
        let requested = secs_to_samples(clip.start, sample_rate);
        let placement = if track.is_empty() {
            requested
        } else {
            requested.max(track.len() + buffer)
        };

        if placement > requested {
            tracing::debug!(
                "Segment {}: shifted {:.3}s later to avoid overlap",
                clip.index,
                (placement - requested) as f64 / rate
            );
        }

        track.append_silence(placement - track.len());
        track.append(&clip.audio);

        placements.push(Placement {
            index: clip.index,
            requested_start: clip.start,
            actual_start: placement as f64 / rate,
            duration: clip.audio.duration_secs(),
            truncated_secs: 0.0,
        });
    }

    if let Some(duration) = source_duration {
        let target = secs_to_samples(duration, sample_rate);
        if track.len() < target {
            track.append_silence(target - track.len());
        }
    }

    (track, placements)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clip(index: usize, start: f64, secs: f64, rate: u32) -> TimelineClip {
        TimelineClip {
            index,
            start,
            end: start + secs,
            audio: AudioData::new(vec![0.2; secs_to_samples(secs, rate)], rate),
        }
    }

    #[test]
    fn overlapping_clip_is_pushed_past_buffer() {
        let rate = 16000;
        let clips = vec![clip(0, 0.0, 2.0, rate), clip(1, 1.0, 1.0, rate)];

        let (track, placements) = mix_sequential(&clips, 50, rate, None);

        assert_eq!(placements[0].actual_start, 0.0);
        assert!(placements[1].actual_start >= 2.0 + 0.05 - 1e-9);
        assert_eq!(track.len(), secs_to_samples(3.05, rate));
    }

    #[test]
    fn first_clip_keeps_its_start() {
        let rate = 1000;
        let clips = vec![clip(0, 0.5, 1.0, rate), clip(1, 4.0, 1.0, rate)];

        let (track, placements) = mix_sequential(&clips, 50, rate, Some(6.0));

        assert_eq!(placements[0].actual_start, 0.5);
        assert_eq!(placements[1].actual_start, 4.0);
        assert_eq!(track.len(), 6000);
        assert!(track.samples[..500].iter().all(|s| *s == 0.0));
    }

    #[test]
    fn nothing_is_truncated() {
        let rate = 1000;
        let clips = vec![clip(0, 0.0, 3.0, rate), clip(1, 1.0, 3.0, rate)];

        let (track, placements) = mix_sequential(&clips, 0, rate, Some(2.0));

        assert_eq!(track.len(), 6000);
        assert!(placements.iter().all(|p| p.truncated_secs == 0.0));
    }
}
