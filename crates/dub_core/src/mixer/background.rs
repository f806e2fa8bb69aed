//! Background bed from the original recording.

use crate::audio::AudioData;

/// Non-speech audio of the original, fitted to `len` samples.
///
/// Speech spans are silenced so the original voices do not bleed under
/// the dub. A bed shorter than `len` is looped, a longer one is trimmed.
pub fn background_bed(
    original: &AudioData,
    speech_spans: &[(f64, f64)],
    len: usize,
    gain_db: f64,
) -> AudioData {
    let mut bed = original.clone();
    for &(start, end) in speech_spans {
        let from = bed.secs_to_samples(start).min(bed.len());
        let to = bed.secs_to_samples(end).min(bed.len());
        if to > from {
            bed.samples[from..to].fill(0.0);
        }
    }

    let samples = if bed.is_empty() {
        vec![0.0; len]
    } else {
        bed.samples.iter().copied().cycle().take(len).collect()
    };

    let mut fitted = AudioData::new(samples, original.sample_rate);
    fitted.apply_gain_db(gain_db);
    fitted
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_bed_is_looped() {
        let original = AudioData::new(vec![1.0, 0.5], 10);
        let bed = background_bed(&original, &[], 5, 0.0);
        assert_eq!(bed.samples, vec![1.0, 0.5, 1.0, 0.5, 1.0]);
    }

    #[test]
    fn speech_is_removed_and_gain_applied() {
        let original = AudioData::new(vec![1.0; 10], 10);
        let bed = background_bed(&original, &[(0.2, 0.5)], 10, -20.0);
        assert_eq!(bed.samples[3], 0.0);
        assert!((bed.samples[0] - 0.1).abs() < 1e-12);
        assert_eq!(bed.len(), 10);
    }
}
