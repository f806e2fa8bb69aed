//! Duration matching for synthesized clips.
//!
//! A translated sentence rarely takes as long to say as the original. Each
//! clip is sped up or slowed down toward its slot, within a clamped range
//! so speech stays natural:
//!
//! - factor > 1: overlap-add time compression (pitch kept)
//! - factor < 1: rate change (clip gets longer and lower)
//!
//! In `fit` mode the result is then padded or trimmed to the exact slot
//! length. In `defer` mode the remainder is left to the mixer.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::audio::{change_rate, read_wav_at, time_stretch, write_wav, AudioData, AudioResult};
use crate::config::TimingSettings;
use crate::models::{Segment, SynthesisTier, TimingMode};

/// Configuration for the timing aligner.
#[derive(Debug, Clone)]
pub struct TimingConfig {
    pub mode: TimingMode,
    pub min_speed: f64,
    pub max_speed: f64,
    /// Clips this close to their slot are left alone (seconds).
    pub tolerance_secs: f64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            mode: TimingMode::Fit,
            min_speed: 0.8,
            max_speed: 1.2,
            tolerance_secs: 0.1,
        }
    }
}

impl From<&TimingSettings> for TimingConfig {
    fn from(settings: &TimingSettings) -> Self {
        Self {
            mode: settings.mode,
            min_speed: settings.min_speed,
            max_speed: settings.max_speed,
            tolerance_secs: settings.tolerance_secs.max(0.0),
        }
    }
}

/// Speed change applied to one clip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClipTiming {
    pub index: usize,
    pub original_secs: f64,
    pub target_secs: f64,
    /// 1.0 when the clip was left alone.
    pub speed_factor: f64,
    pub final_secs: f64,
    /// Audio cut off the end in `fit` mode.
    pub trimmed_secs: f64,
}

/// Timing results for a batch of segments.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TimingReport {
    pub clips: Vec<ClipTiming>,
    /// Segments whose clip could not be read or written.
    pub unreadable: Vec<usize>,
}

impl TimingReport {
    /// Clips that needed a speed change.
    pub fn adjusted(&self) -> usize {
        self.clips
            .iter()
            .filter(|c| (c.speed_factor - 1.0).abs() > f64::EPSILON)
            .count()
    }

    /// Clips that lost audio to trimming.
    pub fn trimmed(&self) -> usize {
        self.clips.iter().filter(|c| c.trimmed_secs > 0.0).count()
    }
}

/// `current / target`, clamped to `[min_speed, max_speed]`.
///
/// Reversed bounds are swapped. A factor that is not a positive finite
/// number falls back to 1.0.
pub fn speed_factor(current_secs: f64, target_secs: f64, min_speed: f64, max_speed: f64) -> f64 {
    if target_secs <= 0.0 || current_secs <= 0.0 {
        return 1.0;
    }
    let (low, high) = if min_speed <= max_speed {
        (min_speed, max_speed)
    } else {
        (max_speed, min_speed)
    };
    let factor = (current_secs / target_secs).max(low).min(high);
    if factor.is_finite() && factor > 0.0 {
        factor
    } else {
        1.0
    }
}

/// Fit one clip to `target_secs`.
///
/// Returns `None` when the clip is within tolerance and needs no change.
/// On change returns `(clip, speed_factor, trimmed_secs)`.
pub fn fit_clip(
    audio: &AudioData,
    target_secs: f64,
    config: &TimingConfig,
) -> Option<(AudioData, f64, f64)> {
    let current = audio.duration_secs();
    if (current - target_secs).abs() <= config.tolerance_secs {
        return None;
    }

    let factor = speed_factor(current, target_secs, config.min_speed, config.max_speed);
    let samples = if factor > 1.0 {
        time_stretch(&audio.samples, audio.sample_rate, factor)
    } else if factor < 1.0 {
        change_rate(&audio.samples, factor)
    } else {
        audio.samples.clone()
    };
    let mut adjusted = AudioData::new(samples, audio.sample_rate);

    let mut trimmed_secs = 0.0;
    if config.mode == TimingMode::Fit {
        let removed = adjusted.fit_to_len(adjusted.secs_to_samples(target_secs));
        trimmed_secs = removed as f64 / audio.sample_rate as f64;
    }

    Some((adjusted, factor, trimmed_secs))
}

/// `<stem>_aligned.wav` beside the original clip.
pub fn aligned_path(clip: &Path) -> PathBuf {
    let stem = clip
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "clip".to_string());
    clip.with_file_name(format!("{}_aligned.wav", stem))
}

/// Time-align every synthesized segment.
///
/// Adjusted clips are written as `<stem>_aligned.wav` and the segment is
/// pointed at them. A clip that cannot be read or written is dropped from
/// the segment so the mixer leaves silence there.
pub fn align_segment_timing(
    segments: &mut [Segment],
    sample_rate: u32,
    config: &TimingConfig,
) -> TimingReport {
    let mut report = TimingReport::default();

    for segment in segments.iter_mut() {
        let Some(path) = segment.audio_path().map(Path::to_path_buf) else {
            continue;
        };
        let tier = segment.synthesis_tier.unwrap_or(SynthesisTier::Basic);
        let target = segment.target_duration();

        match align_clip(&path, target, sample_rate, config) {
            Ok((timing_path, mut timing)) => {
                timing.index = segment.index();
                if timing.trimmed_secs > 0.0 {
                    tracing::warn!(
                        "Segment {}: trimmed {:.2}s to fit its {:.2}s slot",
                        segment.index(),
                        timing.trimmed_secs,
                        target
                    );
                }
                segment.set_synthesized(timing_path, tier);
                report.clips.push(timing);
            }
            Err(e) => {
                tracing::warn!("Segment {}: clip unusable, dropping it: {}", segment.index(), e);
                segment.clear_synthesized();
                report.unreadable.push(segment.index());
            }
        }
    }

    report
}

fn align_clip(
    path: &Path,
    target_secs: f64,
    sample_rate: u32,
    config: &TimingConfig,
) -> AudioResult<(PathBuf, ClipTiming)> {
    let audio = read_wav_at(path, sample_rate)?;
    let original_secs = audio.duration_secs();

    match fit_clip(&audio, target_secs, config) {
        None => Ok((
            path.to_path_buf(),
            ClipTiming {
                index: 0,
                original_secs,
                target_secs,
                speed_factor: 1.0,
                final_secs: original_secs,
                trimmed_secs: 0.0,
            },
        )),
        Some((adjusted, factor, trimmed_secs)) => {
            let out = aligned_path(path);
            write_wav(&out, &adjusted)?;
            Ok((
                out,
                ClipTiming {
                    index: 0,
                    original_secs,
                    target_secs,
                    speed_factor: factor,
                    final_secs: adjusted.duration_secs(),
                    trimmed_secs,
                },
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engines::mock::tone;
    use tempfile::tempdir;

    #[test]
    fn long_clip_is_compressed_to_slot() {
        let audio = tone(200.0, 3.0, 16000);
        let (out, factor, trimmed) = fit_clip(&audio, 2.5, &TimingConfig::default()).unwrap();

        assert!((factor - 1.2).abs() < 1e-9);
        assert!((out.duration_secs() - 2.5).abs() < 1e-9);
        assert_eq!(trimmed, 0.0);
    }

    #[test]
    fn very_long_clip_is_clamped_then_trimmed() {
        let audio = tone(200.0, 4.0, 16000);
        let (out, factor, trimmed) = fit_clip(&audio, 2.0, &TimingConfig::default()).unwrap();

        assert!((factor - 1.2).abs() < 1e-9);
        assert!((out.duration_secs() - 2.0).abs() < 1e-9);
        // 4.0 / 1.2 = 3.33s before the trim
        assert!((trimmed - (4.0 / 1.2 - 2.0)).abs() < 1e-3);
    }

    #[test]
    fn short_clip_is_slowed_and_padded() {
        let audio = tone(200.0, 1.0, 16000);
        let (out, factor, trimmed) = fit_clip(&audio, 2.0, &TimingConfig::default()).unwrap();

        assert!((factor - 0.8).abs() < 1e-9);
        assert!((out.duration_secs() - 2.0).abs() < 1e-9);
        assert_eq!(trimmed, 0.0);
        // Slowed to 1.25s, rest is padding
        assert!(out.samples[out.len() - 100..].iter().all(|s| *s == 0.0));
    }

    #[test]
    fn defer_mode_only_changes_speed() {
        let config = TimingConfig {
            mode: TimingMode::Defer,
            ..Default::default()
        };
        let audio = tone(200.0, 4.0, 16000);
        let (out, _, trimmed) = fit_clip(&audio, 2.0, &config).unwrap();

        assert!((out.duration_secs() - 4.0 / 1.2).abs() < 1e-3);
        assert_eq!(trimmed, 0.0);
    }

    #[test]
    fn clip_within_tolerance_is_untouched() {
        let audio = tone(200.0, 2.05, 16000);
        assert!(fit_clip(&audio, 2.0, &TimingConfig::default()).is_none());
    }

    #[test]
    fn factor_is_clamped() {
        assert_eq!(speed_factor(10.0, 1.0, 0.8, 1.2), 1.2);
        assert_eq!(speed_factor(1.0, 10.0, 0.8, 1.2), 0.8);
    }

    #[test]
    fn reversed_or_degenerate_bounds_do_not_panic() {
        assert_eq!(speed_factor(10.0, 1.0, 1.2, 0.8), 1.2);
        assert_eq!(speed_factor(1.0, 10.0, 1.2, 0.8), 0.8);
        assert_eq!(speed_factor(3.0, 1.0, 0.0, 0.0), 1.0);

        let config = TimingConfig {
            min_speed: 1.5,
            max_speed: 0.5,
            ..TimingConfig::default()
        };
        let (_, factor, _) = fit_clip(&tone(200.0, 3.0, 16000), 2.5, &config).unwrap();
        assert!((factor - 1.2).abs() < 1e-9);
        assert_eq!(speed_factor(1.0, 0.0, 0.8, 1.2), 1.0);
    }

    #[test]
    fn segments_point_at_aligned_clips() {
        let dir = tempdir().unwrap();
        let clip = dir.path().join("seg_0000_S1.wav");
        write_wav(&clip, &tone(200.0, 3.0, 16000)).unwrap();

        let mut segments = vec![
            Segment::new(0, "S1", 0.0, 2.5, "a"),
            Segment::new(1, "S1", 3.0, 4.0, "b"),
            Segment::new(2, "S1", 5.0, 6.0, "c"),
        ];
        segments[0].set_synthesized(clip.clone(), SynthesisTier::VoiceClone);
        segments[1].set_synthesized(dir.path().join("missing.wav"), SynthesisTier::Basic);

        let report = align_segment_timing(&mut segments, 16000, &TimingConfig::default());

        let aligned = segments[0].audio_path().unwrap();
        assert!(aligned.ends_with("seg_0000_S1_aligned.wav"));
        assert_eq!(segments[0].synthesis_tier, Some(SynthesisTier::VoiceClone));
        assert!(!segments[1].is_synthesized());
        assert_eq!(report.unreadable, vec![1]);
        assert_eq!(report.clips.len(), 1);
        assert_eq!(report.clips[0].index, 0);
        assert_eq!(report.adjusted(), 1);
    }
}
