//! Core audio buffer type.

use thiserror::Error;

/// Mono audio held in memory.
///
/// Samples are f64 in `[-1.0, 1.0]`. All timeline operations in the mixer,
/// timing aligner and reference selector work on this type.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioData {
    /// Mono samples.
    pub samples: Vec<f64>,
    /// Sample rate in Hz.
    pub sample_rate: u32,
}

impl AudioData {
    /// Create new audio data from samples.
    pub fn new(samples: Vec<f64>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    /// Silence of the given length in seconds.
    pub fn silence(duration_secs: f64, sample_rate: u32) -> Self {
        let len = secs_to_samples(duration_secs, sample_rate);
        Self::new(vec![0.0; len], sample_rate)
    }

    /// Get the number of samples.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Check if audio data is empty.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Duration in seconds.
    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / self.sample_rate as f64
    }

    /// Convert a time in seconds to a sample offset at this rate.
    pub fn secs_to_samples(&self, secs: f64) -> usize {
        secs_to_samples(secs, self.sample_rate)
    }

    /// Copy out `[start_secs, end_secs)`, clamped to the available audio.
    pub fn slice_secs(&self, start_secs: f64, end_secs: f64) -> AudioData {
        let start = self.secs_to_samples(start_secs).min(self.samples.len());
        let end = self.secs_to_samples(end_secs).min(self.samples.len());
        let samples = if end > start {
            self.samples[start..end].to_vec()
        } else {
            Vec::new()
        };
        AudioData::new(samples, self.sample_rate)
    }

    /// Pad with trailing silence or truncate to exactly `len` samples.
    ///
    /// Returns the number of samples removed (0 when padded or unchanged).
    pub fn fit_to_len(&mut self, len: usize) -> usize {
        let removed = self.samples.len().saturating_sub(len);
        self.samples.resize(len, 0.0);
        removed
    }

    /// Append trailing silence.
    pub fn append_silence(&mut self, len: usize) {
        self.samples.resize(self.samples.len() + len, 0.0);
    }

    /// Append another buffer at the same sample rate.
    pub fn append(&mut self, other: &AudioData) {
        self.samples.extend_from_slice(&other.samples);
    }

    /// Add `other` into this buffer starting at `offset`.
    ///
    /// Samples past the end of this buffer are dropped; returns how many
    /// samples of `other` were mixed in.
    pub fn overlay_at(&mut self, other: &[f64], offset: usize) -> usize {
        if offset >= self.samples.len() {
            return 0;
        }
        let available = self.samples.len() - offset;
        let count = other.len().min(available);
        for (dst, src) in self.samples[offset..offset + count].iter_mut().zip(other) {
            *dst += *src;
        }
        count
    }

    /// Scale by a gain in decibels.
    pub fn apply_gain_db(&mut self, gain_db: f64) {
        let factor = 10f64.powf(gain_db / 20.0);
        for sample in &mut self.samples {
            *sample *= factor;
        }
    }

    /// Hard-limit every sample to `[-1.0, 1.0]`.
    pub fn clamp(&mut self) {
        for sample in &mut self.samples {
            *sample = sample.clamp(-1.0, 1.0);
        }
    }

    /// Root-mean-square level.
    pub fn rms(&self) -> f64 {
        rms(&self.samples)
    }
}

/// Convert seconds to a sample count at the given rate (rounded).
pub fn secs_to_samples(secs: f64, sample_rate: u32) -> usize {
    if secs <= 0.0 {
        return 0;
    }
    (secs * sample_rate as f64).round() as usize
}

/// Convert whole milliseconds to a sample count at the given rate.
pub fn ms_to_samples(ms: u64, sample_rate: u32) -> usize {
    ((ms as u128 * sample_rate as u128) / 1000) as usize
}

/// Root-mean-square of a sample slice.
pub fn rms(samples: &[f64]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum: f64 = samples.iter().map(|s| s * s).sum();
    (sum / samples.len() as f64).sqrt()
}

/// Errors from audio I/O and processing.
#[derive(Error, Debug)]
pub enum AudioError {
    /// FFmpeg failed or is unavailable.
    #[error("FFmpeg error: {0}")]
    FfmpegError(String),

    /// WAV read/write failure.
    #[error("WAV error in {path}: {source}")]
    WavError {
        path: String,
        #[source]
        source: hound::Error,
    },

    /// Audio decoded but unusable.
    #[error("Invalid audio: {0}")]
    InvalidAudio(String),

    /// IO error.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Source file not found.
    #[error("Source file not found: {0}")]
    SourceNotFound(String),
}

/// Type alias for audio results.
pub type AudioResult<T> = Result<T, AudioError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn silence_has_requested_length() {
        let audio = AudioData::silence(1.5, 16000);
        assert_eq!(audio.len(), 24000);
        assert!((audio.duration_secs() - 1.5).abs() < 1e-9);
    }

    #[test]
    fn slice_clamps_to_available_audio() {
        let audio = AudioData::new((0..1000).map(|i| i as f64 / 1000.0).collect(), 1000);
        let chunk = audio.slice_secs(0.25, 0.75);
        assert_eq!(chunk.len(), 500);
        assert!((chunk.samples[0] - 0.25).abs() < 1e-9);

        let past_end = audio.slice_secs(0.9, 2.0);
        assert_eq!(past_end.len(), 100);

        let beyond = audio.slice_secs(5.0, 6.0);
        assert!(beyond.is_empty());
    }

    #[test]
    fn fit_to_len_pads_and_truncates() {
        let mut audio = AudioData::new(vec![0.5; 10], 10);
        assert_eq!(audio.fit_to_len(15), 0);
        assert_eq!(audio.len(), 15);
        assert_eq!(audio.samples[14], 0.0);

        assert_eq!(audio.fit_to_len(4), 11);
        assert_eq!(audio.len(), 4);
    }

    #[test]
    fn overlay_adds_and_clips_at_end() {
        let mut base = AudioData::new(vec![0.1; 10], 10);
        let written = base.overlay_at(&[0.2; 5], 8);
        assert_eq!(written, 2);
        assert!((base.samples[8] - 0.3).abs() < 1e-9);
        assert!((base.samples[7] - 0.1).abs() < 1e-9);
        assert_eq!(base.overlay_at(&[1.0], 10), 0);
    }

    #[test]
    fn gain_of_minus_twenty_db_is_one_tenth() {
        let mut audio = AudioData::new(vec![1.0, -0.5], 10);
        audio.apply_gain_db(-20.0);
        assert!((audio.samples[0] - 0.1).abs() < 1e-9);
        assert!((audio.samples[1] + 0.05).abs() < 1e-9);
    }

    #[test]
    fn ms_conversion_is_exact() {
        assert_eq!(ms_to_samples(50, 16000), 800);
        assert_eq!(ms_to_samples(1000, 22050), 22050);
    }
}
