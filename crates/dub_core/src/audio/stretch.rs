//! Resampling and duration changes.
//!
//! Two ways to change a clip's duration:
//! - [`time_stretch`]: overlap-add with a Hann window; duration changes,
//!   pitch does not. Used to speed clips up.
//! - [`change_rate`]: plain resampling played back at the original rate;
//!   duration and pitch change together. Used to slow clips down.

use std::f64::consts::PI;

use super::types::AudioData;

/// Analysis frame length for overlap-add, in seconds.
const OLA_FRAME_SECS: f64 = 0.040;

/// Resample to `target_rate` with linear interpolation.
pub fn resample(audio: &AudioData, target_rate: u32) -> AudioData {
    if audio.sample_rate == target_rate {
        return audio.clone();
    }
    if audio.is_empty() || audio.sample_rate == 0 {
        return AudioData::new(audio.samples.clone(), target_rate);
    }

    let ratio = audio.sample_rate as f64 / target_rate as f64;
    let out_len = ((audio.len() as f64) / ratio).round() as usize;
    AudioData::new(interpolate(&audio.samples, ratio, out_len), target_rate)
}

/// Play `samples` `factor` times faster by resampling.
///
/// `factor < 1.0` lengthens the clip and lowers its pitch.
pub fn change_rate(samples: &[f64], factor: f64) -> Vec<f64> {
    if samples.is_empty() || factor <= 0.0 || (factor - 1.0).abs() < f64::EPSILON {
        return samples.to_vec();
    }
    let out_len = ((samples.len() as f64) / factor).round() as usize;
    interpolate(samples, factor, out_len)
}

/// Change duration by `1 / factor` while keeping pitch.
///
/// `factor > 1.0` shortens the clip. Frames are read from the input with
/// a hop of `factor` times the output hop and summed under a Hann window.
pub fn time_stretch(samples: &[f64], sample_rate: u32, factor: f64) -> Vec<f64> {
    if samples.is_empty() || factor <= 0.0 || (factor - 1.0).abs() < f64::EPSILON {
        return samples.to_vec();
    }

    let out_len = ((samples.len() as f64) / factor).round() as usize;
    let frame = ((OLA_FRAME_SECS * sample_rate as f64) as usize).max(16);

    // Clip shorter than one frame: nothing to overlap, fall back to resampling
    if samples.len() <= frame {
        return change_rate(samples, factor);
    }

    let synthesis_hop = frame / 2;
    let analysis_hop = synthesis_hop as f64 * factor;
    let window: Vec<f64> = (0..frame)
        .map(|i| 0.5 - 0.5 * (2.0 * PI * i as f64 / frame as f64).cos())
        .collect();

    let mut output = vec![0.0; out_len + frame];
    let mut weights = vec![0.0; out_len + frame];

    let mut k = 0usize;
    loop {
        let in_pos = (k as f64 * analysis_hop).round() as usize;
        let out_pos = k * synthesis_hop;
        if in_pos >= samples.len() || out_pos >= out_len {
            break;
        }

        for (i, w) in window.iter().enumerate() {
            let src = match samples.get(in_pos + i) {
                Some(s) => *s,
                None => break,
            };
            output[out_pos + i] += src * w;
            weights[out_pos + i] += w;
        }
        k += 1;
    }

    for (sample, weight) in output.iter_mut().zip(&weights) {
        if *weight > 1e-6 {
            *sample /= weight;
        }
    }

    output.truncate(out_len);
    output
}

/// Read `out_len` samples from `samples`, advancing `step` input samples
/// per output sample.
fn interpolate(samples: &[f64], step: f64, out_len: usize) -> Vec<f64> {
    let last = samples.len().saturating_sub(1);
    (0..out_len)
        .map(|i| {
            let pos = i as f64 * step;
            let idx = pos.floor() as usize;
            if idx >= last {
                return samples[last];
            }
            let frac = pos - idx as f64;
            samples[idx] * (1.0 - frac) + samples[idx + 1] * frac
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(freq: f64, sample_rate: u32, secs: f64) -> Vec<f64> {
        let n = (sample_rate as f64 * secs) as usize;
        (0..n)
            .map(|i| (2.0 * PI * freq * i as f64 / sample_rate as f64).sin() * 0.5)
            .collect()
    }

    fn zero_crossings(samples: &[f64]) -> usize {
        samples
            .windows(2)
            .filter(|w| (w[0] < 0.0) != (w[1] < 0.0))
            .count()
    }

    #[test]
    fn resample_changes_length_by_rate_ratio() {
        let audio = AudioData::new(sine(440.0, 22050, 1.0), 22050);
        let resampled = resample(&audio, 16000);
        assert_eq!(resampled.sample_rate, 16000);
        assert_eq!(resampled.len(), 16000);
    }

    #[test]
    fn resample_same_rate_is_identity() {
        let audio = AudioData::new(vec![0.1, 0.2, 0.3], 16000);
        assert_eq!(resample(&audio, 16000), audio);
    }

    #[test]
    fn time_stretch_shortens_and_keeps_pitch() {
        let input = sine(200.0, 16000, 3.0);
        let output = time_stretch(&input, 16000, 1.2);
        assert_eq!(output.len(), 40000);

        // Crossings per second stay near 2 * 200 Hz
        let rate_in = zero_crossings(&input) as f64 / 3.0;
        let rate_out = zero_crossings(&output) as f64 / (output.len() as f64 / 16000.0);
        assert!((rate_out - rate_in).abs() / rate_in < 0.1);
    }

    #[test]
    fn change_rate_lowers_pitch_when_slowing() {
        let input = sine(200.0, 16000, 1.0);
        let output = change_rate(&input, 0.8);
        assert_eq!(output.len(), 20000);

        let rate_in = zero_crossings(&input) as f64;
        let rate_out = zero_crossings(&output) as f64 / 1.25;
        assert!(rate_out < rate_in * 0.9);
    }

    #[test]
    fn unit_factor_is_identity() {
        let input = sine(200.0, 16000, 0.1);
        assert_eq!(time_stretch(&input, 16000, 1.0), input);
        assert_eq!(change_rate(&input, 1.0), input);
    }
}
