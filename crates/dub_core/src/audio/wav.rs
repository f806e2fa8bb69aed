//! WAV file reading and writing.
//!
//! Clips coming back from synthesis engines may be any PCM or float WAV,
//! mono or multi-channel. They are downmixed to mono on read. Everything
//! the pipeline writes is mono 16-bit PCM.

use std::fs;
use std::path::Path;

use hound::{SampleFormat, WavReader, WavSpec, WavWriter};

use super::types::{AudioData, AudioError, AudioResult};

/// Read a WAV file as mono f64 audio.
pub fn read_wav(path: &Path) -> AudioResult<AudioData> {
    if !path.exists() {
        return Err(AudioError::SourceNotFound(path.display().to_string()));
    }

    let wav_error = |source| AudioError::WavError {
        path: path.display().to_string(),
        source,
    };

    let mut reader = WavReader::open(path).map_err(wav_error)?;
    let spec = reader.spec();
    let channels = spec.channels.max(1) as usize;

    let interleaved: Vec<f64> = match spec.sample_format {
        SampleFormat::Float => reader
            .samples::<f32>()
            .map(|s| s.map(|v| v as f64))
            .collect::<Result<_, _>>()
            .map_err(wav_error)?,
        SampleFormat::Int => {
            let scale = (1i64 << (spec.bits_per_sample.saturating_sub(1))) as f64;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f64 / scale))
                .collect::<Result<_, _>>()
                .map_err(wav_error)?
        }
    };

    let samples = if channels == 1 {
        interleaved
    } else {
        interleaved
            .chunks_exact(channels)
            .map(|frame| frame.iter().sum::<f64>() / channels as f64)
            .collect()
    };

    tracing::debug!(
        "Read {} ({} Hz, {} ch, {:.2}s)",
        path.display(),
        spec.sample_rate,
        channels,
        samples.len() as f64 / spec.sample_rate.max(1) as f64
    );

    Ok(AudioData::new(samples, spec.sample_rate))
}

/// Write mono audio as 16-bit PCM WAV, creating parent directories.
pub fn write_wav(path: &Path, audio: &AudioData) -> AudioResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let wav_error = |source| AudioError::WavError {
        path: path.display().to_string(),
        source,
    };

    let spec = WavSpec {
        channels: 1,
        sample_rate: audio.sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };

    let mut writer = WavWriter::create(path, spec).map_err(wav_error)?;
    for sample in &audio.samples {
        let value = (sample.clamp(-1.0, 1.0) * i16::MAX as f64).round() as i16;
        writer.write_sample(value).map_err(wav_error)?;
    }
    writer.finalize().map_err(wav_error)?;

    Ok(())
}

/// Check that a file exists and is not empty.
pub fn is_non_empty_file(path: &Path) -> bool {
    fs::metadata(path)
        .map(|m| m.is_file() && m.len() > 0)
        .unwrap_or(false)
}
