//! Timeline mixer.
//!
//! Places every synthesized clip on a single master track. Two policies:
//!
//! - [`MixPolicy::FixedSlot`]: each clip sits in its original slot,
//!   truncated to fit. Output length equals the source exactly.
//! - [`MixPolicy::Sequential`]: clips are appended in order and pushed
//!   later instead of overlapping. Nothing is truncated; the output may
//!   run longer than the source.
//!
//! Every truncation and every skipped segment is logged.

mod background;
mod fixed_slot;
mod sequential;

pub use background::background_bed;
pub use fixed_slot::mix_fixed_slot;
pub use sequential::mix_sequential;

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::audio::{read_wav_at, write_wav, AudioData, AudioResult};
use crate::config::MixerSettings;
use crate::models::{MixPolicy, Segment};

/// Configuration for the mixer.
#[derive(Debug, Clone)]
pub struct MixerConfig {
    pub policy: MixPolicy,
    /// Minimum gap between clips in sequential mode.
    pub buffer_ms: u64,
    pub preserve_background: bool,
    pub background_gain_db: f64,
}

impl Default for MixerConfig {
    fn default() -> Self {
        Self {
            policy: MixPolicy::FixedSlot,
            buffer_ms: 50,
            preserve_background: false,
            background_gain_db: -20.0,
        }
    }
}

impl From<&MixerSettings> for MixerConfig {
    fn from(settings: &MixerSettings) -> Self {
        Self {
            policy: settings.policy,
            buffer_ms: settings.buffer_ms,
            preserve_background: settings.preserve_background,
            background_gain_db: settings.background_gain_db,
        }
    }
}

/// A loaded clip with its slot on the source timeline.
#[derive(Debug, Clone)]
pub struct TimelineClip {
    pub index: usize,
    pub start: f64,
    pub end: f64,
    pub audio: AudioData,
}

/// Where one clip ended up.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    pub index: usize,
    pub requested_start: f64,
    pub actual_start: f64,
    /// Length of audio actually placed.
    pub duration: f64,
    /// Audio dropped to fit the slot or the track.
    pub truncated_secs: f64,
}

/// Result of a mix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MixReport {
    pub policy: MixPolicy,
    pub placements: Vec<Placement>,
    /// Segments left silent (no clip, or clip unreadable).
    pub skipped: Vec<usize>,
    pub total_duration: f64,
    pub background: bool,
}

impl MixReport {
    pub fn truncated(&self) -> usize {
        self.placements
            .iter()
            .filter(|p| p.truncated_secs > 0.0)
            .count()
    }

    /// Largest delay sequential placement introduced.
    pub fn max_shift_secs(&self) -> f64 {
        self.placements
            .iter()
            .map(|p| p.actual_start - p.requested_start)
            .fold(0.0, f64::max)
    }
}

/// Load the synthesized clip of every segment at `sample_rate`.
///
/// Segments without audio, or whose clip cannot be read, are returned
/// as skipped indices.
pub fn load_clips(segments: &[Segment], sample_rate: u32) -> (Vec<TimelineClip>, Vec<usize>) {
    let mut clips = Vec::new();
    let mut skipped = Vec::new();

    for segment in segments {
        let Some(path) = segment.audio_path() else {
            tracing::info!("Segment {} has no audio; leaving silence", segment.index());
            skipped.push(segment.index());
            continue;
        };
        match read_wav_at(path, sample_rate) {
            Ok(audio) => clips.push(TimelineClip {
                index: segment.index(),
                start: segment.start(),
                end: segment.end(),
                audio,
            }),
            Err(e) => {
                tracing::warn!("Segment {}: could not read clip: {}", segment.index(), e);
                skipped.push(segment.index());
            }
        }
    }

    clips.sort_by(|a, b| a.start.total_cmp(&b.start));
    (clips, skipped)
}

/// Mix loaded clips with the configured policy.
///
/// `source_duration` is the length of the original recording when known;
/// `original` enables background preservation.
pub fn mix_clips(
    clips: &[TimelineClip],
    sample_rate: u32,
    source_duration: Option<f64>,
    original: Option<&AudioData>,
    config: &MixerConfig,
) -> (AudioData, Vec<Placement>, bool) {
    let (mut track, placements) = match config.policy {
        MixPolicy::FixedSlot => {
            let total = source_duration
                .unwrap_or_else(|| clips.iter().map(|c| c.end).fold(0.0, f64::max));
            mix_fixed_slot(clips, total, sample_rate)
        }
        MixPolicy::Sequential => mix_sequential(clips, config.buffer_ms, sample_rate, source_duration),
    };

    let mut background = false;
    if config.preserve_background {
        if let Some(original) = original {
            let spans: Vec<(f64, f64)> = clips.iter().map(|c| (c.start, c.end)).collect();
            let bed = background_bed(original, &spans, track.len(), config.background_gain_db);
            track.overlay_at(&bed.samples, 0);
            background = true;
        }
    }

    track.clamp();
    (track, placements, background)
}

/// Mix every segment and write the master WAV to `output_path`.
pub fn mix_segments(
    segments: &[Segment],
    sample_rate: u32,
    source_duration: Option<f64>,
    original: Option<&AudioData>,
    output_path: &Path,
    config: &MixerConfig,
) -> AudioResult<MixReport> {
    let (clips, skipped) = load_clips(segments, sample_rate);
    let (track, placements, background) =
        mix_clips(&clips, sample_rate, source_duration, original, config);

    write_wav(output_path, &track)?;

    Ok(MixReport {
        policy: config.policy,
        placements,
        skipped,
        total_duration: track.duration_secs(),
        background,
    })
}
