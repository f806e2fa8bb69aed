//! Butterworth filtering via the biquad crate.
//!
//! Used to isolate the voice fundamental before pitch estimation: a
//! high-pass removes rumble and DC, a low-pass removes formants and
//! sibilance that confuse the autocorrelation peak.

use biquad::{Biquad, Coefficients, DirectForm2Transposed, ToHertz, Type, Q_BUTTERWORTH_F64};

/// Apply a Butterworth low-pass filter using cascaded biquad sections.
pub fn lowpass(samples: &[f64], sample_rate: u32, cutoff_hz: f64, order: usize) -> Vec<f64> {
    apply(samples, Pass::Low, sample_rate, cutoff_hz, order)
}

/// Apply a Butterworth high-pass filter using cascaded biquad sections.
pub fn highpass(samples: &[f64], sample_rate: u32, cutoff_hz: f64, order: usize) -> Vec<f64> {
    apply(samples, Pass::High, sample_rate, cutoff_hz, order)
}

/// Band-pass as a high-pass followed by a low-pass.
pub fn bandpass(
    samples: &[f64],
    sample_rate: u32,
    low_hz: f64,
    high_hz: f64,
    order: usize,
) -> Vec<f64> {
    let high_passed = highpass(samples, sample_rate, low_hz, order);
    lowpass(&high_passed, sample_rate, high_hz, order)
}

#[derive(Clone, Copy)]
enum Pass {
    Low,
    High,
}

fn apply(
    samples: &[f64],
    pass: Pass,
    sample_rate: u32,
    cutoff_hz: f64,
    order: usize,
) -> Vec<f64> {
    if samples.is_empty() {
        return Vec::new();
    }

    // Cutoff must sit below Nyquist or the coefficients are invalid
    let nyquist = sample_rate as f64 / 2.0;
    if cutoff_hz <= 0.0 || cutoff_hz >= nyquist {
        return samples.to_vec();
    }

    let filter_type = match pass {
        Pass::Low => Type::LowPass,
        Pass::High => Type::HighPass,
    };

    let coeffs = match Coefficients::<f64>::from_params(
        filter_type,
        sample_rate.hz(),
        cutoff_hz.hz(),
        Q_BUTTERWORTH_F64,
    ) {
        Ok(c) => c,
        Err(_) => return samples.to_vec(),
    };

    // A biquad is 2nd order, so order/2 sections (minimum 1)
    let num_sections = ((order + 1) / 2).max(1);
    let mut result = samples.to_vec();

    for _ in 0..num_sections {
        let mut filter = DirectForm2Transposed::<f64>::new(coeffs);
        for sample in &mut result {
            *sample = filter.run(*sample);
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    fn sine(freq: f64, sample_rate: u32, secs: f64) -> Vec<f64> {
        let n = (sample_rate as f64 * secs) as usize;
        (0..n)
            .map(|i| (2.0 * PI * freq * i as f64 / sample_rate as f64).sin())
            .collect()
    }

    fn tail_rms(samples: &[f64]) -> f64 {
        let tail = &samples[samples.len() / 2..];
        (tail.iter().map(|s| s * s).sum::<f64>() / tail.len() as f64).sqrt()
    }

    #[test]
    fn lowpass_attenuates_high_frequencies() {
        let high = sine(4000.0, 16000, 0.5);
        let filtered = lowpass(&high, 16000, 500.0, 4);
        assert!(tail_rms(&filtered) < tail_rms(&high) * 0.1);
    }

    #[test]
    fn lowpass_passes_low_frequencies() {
        let low = sine(150.0, 16000, 0.5);
        let filtered = lowpass(&low, 16000, 1000.0, 4);
        assert!(tail_rms(&filtered) > tail_rms(&low) * 0.8);
    }

    #[test]
    fn invalid_cutoff_returns_input() {
        let samples = vec![0.1, 0.2, 0.3];
        assert_eq!(lowpass(&samples, 16000, 9000.0, 2), samples);
        assert!(highpass(&[], 16000, 100.0, 2).is_empty());
    }
}
