//! Fundamental-frequency estimation and gender heuristic.
//!
//! Pitch is estimated per frame from the FFT autocorrelation of a
//! band-limited copy of the signal. Frames that are too quiet or whose
//! normalized autocorrelation peak is weak are treated as unvoiced.

use rustfft::{num_complex::Complex, FftPlanner};

use super::filtering::bandpass;
use super::types::{rms, AudioData};
use crate::models::Gender;

/// Lowest fundamental considered, in Hz.
const MIN_F0_HZ: f64 = 60.0;
/// Highest fundamental considered, in Hz.
const MAX_F0_HZ: f64 = 400.0;
/// Analysis frame length in seconds.
const FRAME_SECS: f64 = 0.040;
/// Hop between frames in seconds.
const HOP_SECS: f64 = 0.020;
/// Frames quieter than this RMS are unvoiced.
const MIN_FRAME_RMS: f64 = 0.01;
/// Normalized autocorrelation peak required to call a frame voiced.
const VOICING_THRESHOLD: f64 = 0.3;

/// Result of pitch analysis over a clip.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PitchEstimate {
    /// Mean F0 over voiced frames, in Hz.
    pub mean_f0_hz: f64,
    /// Number of frames that contributed.
    pub voiced_frames: usize,
    /// Total frames analyzed.
    pub total_frames: usize,
}

/// Estimate the mean fundamental frequency over voiced frames.
///
/// Returns `None` when no frame is voiced.
pub fn estimate_pitch(audio: &AudioData) -> Option<PitchEstimate> {
    let rate = audio.sample_rate as f64;
    let frame_len = (FRAME_SECS * rate) as usize;
    let hop = ((HOP_SECS * rate) as usize).max(1);
    let min_lag = (rate / MAX_F0_HZ).floor() as usize;
    let max_lag = ((rate / MIN_F0_HZ).ceil() as usize).min(frame_len.saturating_sub(1));

    if frame_len == 0 || audio.len() < frame_len || min_lag == 0 || max_lag <= min_lag {
        return None;
    }

    let filtered = bandpass(&audio.samples, audio.sample_rate, 50.0, 1000.0, 4);

    // Zero-pad to 2N so the circular correlation equals the linear one
    let fft_len = (frame_len * 2).next_power_of_two();
    let mut planner = FftPlanner::<f64>::new();
    let fft = planner.plan_fft_forward(fft_len);
    let ifft = planner.plan_fft_inverse(fft_len);

    let mut sum_f0 = 0.0;
    let mut voiced = 0usize;
    let mut total = 0usize;
    let mut buffer = vec![Complex::new(0.0, 0.0); fft_len];

    let mut start = 0;
    while start + frame_len <= filtered.len() {
        total += 1;
        let frame = &filtered[start..start + frame_len];
        start += hop;

        if rms(frame) < MIN_FRAME_RMS {
            continue;
        }

        for (slot, value) in buffer.iter_mut().enumerate() {
            *value = Complex::new(frame.get(slot).copied().unwrap_or(0.0), 0.0);
        }
        fft.process(&mut buffer);
        for value in buffer.iter_mut() {
            *value = Complex::new(value.norm_sqr(), 0.0);
        }
        ifft.process(&mut buffer);

        let zero_lag = buffer[0].re;
        if zero_lag <= 1e-12 {
            continue;
        }

        let (best_lag, best_value) = (min_lag..=max_lag)
            .map(|lag| (lag, buffer[lag].re / zero_lag))
            .fold((0, f64::MIN), |best, cur| if cur.1 > best.1 { cur } else { best });

        if best_value < VOICING_THRESHOLD || best_lag == 0 {
            continue;
        }

        let lag = refine_peak(&buffer, best_lag, min_lag, max_lag);
        sum_f0 += rate / lag;
        voiced += 1;
    }

    if voiced == 0 {
        return None;
    }

    Some(PitchEstimate {
        mean_f0_hz: sum_f0 / voiced as f64,
        voiced_frames: voiced,
        total_frames: total,
    })
}

/// Classify gender from a pitch estimate.
///
/// Mean F0 above `threshold_hz` is female; anything else, including no
/// voiced frames at all, is male.
pub fn classify_gender(estimate: Option<PitchEstimate>, threshold_hz: f64) -> Gender {
    match estimate {
        Some(e) if e.mean_f0_hz > threshold_hz => Gender::Female,
        _ => Gender::Male,
    }
}

/// Parabolic interpolation around the integer peak.
fn refine_peak(acf: &[Complex<f64>], lag: usize, min_lag: usize, max_lag: usize) -> f64 {
    if lag <= min_lag || lag >= max_lag {
        return lag as f64;
    }
    let (a, b, c) = (acf[lag - 1].re, acf[lag].re, acf[lag + 1].re);
    let denom = a - 2.0 * b + c;
    if denom.abs() < 1e-12 {
        return lag as f64;
    }
    let offset = 0.5 * (a - c) / denom;
    lag as f64 + offset.clamp(-0.5, 0.5)
}
