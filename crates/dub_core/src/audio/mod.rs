//! Audio primitives for the dubbing pipeline.
//!
//! This module provides:
//! - An in-memory mono buffer ([`AudioData`]) with timeline helpers
//! - WAV read/write via hound
//! - FFmpeg decoding of arbitrary inputs to mono PCM
//! - Resampling, pitch-preserving time compression, rate change
//! - Pitch estimation for the gender heuristic

mod ffmpeg;
mod filtering;
mod pitch;
mod stretch;
mod types;
mod wav;

pub use ffmpeg::{decode_to_wav, DEFAULT_SAMPLE_RATE};
pub use filtering::{bandpass, highpass, lowpass};
pub use pitch::{classify_gender, estimate_pitch, PitchEstimate};
pub use stretch::{change_rate, resample, time_stretch};
pub use types::{ms_to_samples, rms, secs_to_samples, AudioData, AudioError, AudioResult};
pub use wav::{is_non_empty_file, read_wav, write_wav};

/// Read a WAV and resample it to `sample_rate` if needed.
pub fn read_wav_at(path: &std::path::Path, sample_rate: u32) -> AudioResult<AudioData> {
    let audio = read_wav(path)?;
    Ok(resample(&audio, sample_rate))
}
