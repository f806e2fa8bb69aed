//! FFmpeg audio decoding.
//!
//! Decodes any container FFmpeg understands into a mono 16-bit PCM WAV at
//! the pipeline sample rate. This is the default [`AudioDecoder`] and the
//! only place the pipeline shells out for audio I/O.
//!
//! [`AudioDecoder`]: crate::engines::AudioDecoder

use std::ffi::OsString;
use std::path::Path;
use std::process::{Command, Stdio};

use super::types::{AudioError, AudioResult};

/// Default pipeline sample rate (16 kHz, what recognizers expect).
pub const DEFAULT_SAMPLE_RATE: u32 = 16000;

/// Build the FFmpeg argument list for a mono PCM decode.
pub fn decode_args(input_path: &Path, output_path: &Path, sample_rate: u32) -> Vec<OsString> {
    vec![
        "-y".into(),
        "-hide_banner".into(),
        "-loglevel".into(),
        "error".into(),
        "-i".into(),
        input_path.as_os_str().to_owned(),
        "-vn".into(),
        "-ac".into(),
        "1".into(),
        "-ar".into(),
        sample_rate.to_string().into(),
        "-acodec".into(),
        "pcm_s16le".into(),
        output_path.as_os_str().to_owned(),
    ]
}

/// Decode `input_path` to a mono WAV at `output_path`.
pub fn decode_to_wav(input_path: &Path, output_path: &Path, sample_rate: u32) -> AudioResult<()> {
    if !input_path.exists() {
        return Err(AudioError::SourceNotFound(
            input_path.display().to_string(),
        ));
    }

    if let Some(parent) = output_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let mut cmd = Command::new("ffmpeg");
    cmd.args(decode_args(input_path, output_path, sample_rate))
        .stdout(Stdio::null())
        .stderr(Stdio::piped());

    tracing::debug!("Running FFmpeg: {:?}", cmd);

    let output = cmd
        .output()
        .map_err(|e| AudioError::FfmpegError(format!("Failed to spawn FFmpeg: {}", e)))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(AudioError::FfmpegError(format!(
            "FFmpeg exited with code {:?}: {}",
            output.status.code(),
            stderr.trim()
        )));
    }

    if !super::wav::is_non_empty_file(output_path) {
        return Err(AudioError::InvalidAudio(format!(
            "FFmpeg produced no audio for {}",
            input_path.display()
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn decode_args_request_mono_pcm() {
        let args = decode_args(
            &PathBuf::from("in.mp4"),
            &PathBuf::from("out.wav"),
            16000,
        );
        let joined: Vec<String> = args
            .iter()
            .map(|a| a.to_string_lossy().to_string())
            .collect();

        let ac = joined.iter().position(|a| a == "-ac").unwrap();
        assert_eq!(joined[ac + 1], "1");
        let ar = joined.iter().position(|a| a == "-ar").unwrap();
        assert_eq!(joined[ar + 1], "16000");
        assert_eq!(joined.last().unwrap(), "out.wav");
    }

    #[test]
    fn decode_rejects_missing_file() {
        let result = decode_to_wav(
            Path::new("/nonexistent/file.mkv"),
            Path::new("/tmp/out.wav"),
            16000,
        );
        assert!(matches!(result, Err(AudioError::SourceNotFound(_))));
    }
}
