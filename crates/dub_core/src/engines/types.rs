//! Collaborator data types and errors.

use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One diarization turn: a speaker talking over `[start, end)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeakerTurn {
    #[serde(alias = "speaker")]
    pub speaker_id: String,
    pub start: f64,
    pub end: f64,
}

impl SpeakerTurn {
    pub fn new(speaker_id: impl Into<String>, start: f64, end: f64) -> Self {
        Self {
            speaker_id: speaker_id.into(),
            start,
            end,
        }
    }
}

/// One recognized interval of speech.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptSegment {
    pub start: f64,
    pub end: f64,
    pub text: String,
}

impl TranscriptSegment {
    pub fn new(start: f64, end: f64, text: impl Into<String>) -> Self {
        Self {
            start,
            end,
            text: text.into(),
        }
    }
}

/// Recognizer output.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Transcript {
    /// Detected (or forced) source language code.
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub segments: Vec<TranscriptSegment>,
}

/// Arguments for one synthesis call.
#[derive(Debug, Clone, Copy)]
pub struct SynthesisRequest<'a> {
    /// Text to speak.
    pub text: &'a str,
    /// Target language code.
    pub language: &'a str,
    /// Reference clip to clone from, if the engine clones.
    pub reference: Option<&'a Path>,
    /// Preset voice name, if the engine uses presets.
    pub voice: Option<&'a str>,
    /// Where the engine should write its WAV.
    pub output_path: &'a Path,
}

/// Errors from external collaborators.
#[derive(Error, Debug)]
pub enum EngineError {
    /// No command or model configured for this engine.
    #[error("{engine} is not configured")]
    NotConfigured { engine: String },

    /// The engine could not be initialized.
    #[error("Failed to load {engine}: {message}")]
    LoadFailed { engine: String, message: String },

    /// The translator cannot translate between these languages.
    #[error("Translation from '{from_lang}' to '{to_lang}' is not supported")]
    UnsupportedLanguagePair { from_lang: String, to_lang: String },

    /// The engine has nothing for this language (e.g. no preset voice).
    #[error("{engine} does not support language '{language}'")]
    UnsupportedLanguage { engine: String, language: String },

    /// An external command failed.
    #[error("{tool} failed with exit code {exit_code}: {message}")]
    CommandFailed {
        tool: String,
        exit_code: i32,
        message: String,
    },

    /// Engine output could not be parsed.
    #[error("Failed to parse {what}: {message}")]
    ParseError { what: String, message: String },

    /// File I/O error.
    #[error("I/O error in {operation}: {source}")]
    IoError {
        operation: String,
        #[source]
        source: io::Error,
    },

    /// Generic engine error with message.
    #[error("{0}")]
    Other(String),
}

impl EngineError {
    /// Create a not configured error.
    pub fn not_configured(engine: impl Into<String>) -> Self {
        Self::NotConfigured {
            engine: engine.into(),
        }
    }

    /// Create an unsupported language pair error.
    pub fn unsupported_pair(from_lang: impl Into<String>, to_lang: impl Into<String>) -> Self {
        Self::UnsupportedLanguagePair {
            from_lang: from_lang.into(),
            to_lang: to_lang.into(),
        }
    }

    /// Create a command failed error.
    pub fn command_failed(
        tool: impl Into<String>,
        exit_code: i32,
        message: impl Into<String>,
    ) -> Self {
        Self::CommandFailed {
            tool: tool.into(),
            exit_code,
            message: message.into(),
        }
    }

    /// Create a parse error.
    pub fn parse_error(what: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ParseError {
            what: what.into(),
            message: message.into(),
        }
    }

    /// Create an I/O error with context.
    pub fn io_error(operation: impl Into<String>, source: io::Error) -> Self {
        Self::IoError {
            operation: operation.into(),
            source,
        }
    }

    /// Create a generic error.
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other(message.into())
    }

    /// Whether this is the unsupported language pair signal.
    pub fn is_unsupported_pair(&self) -> bool {
        matches!(self, Self::UnsupportedLanguagePair { .. })
    }
}

/// Result type for engine calls.
pub type EngineResult<T> = Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn turn_accepts_speaker_alias() {
        let turns: Vec<SpeakerTurn> =
            serde_json::from_str(r#"[{"speaker": "SPEAKER_00", "start": 0.0, "end": 1.5}]"#)
                .unwrap();
        assert_eq!(turns[0].speaker_id, "SPEAKER_00");
    }

    #[test]
    fn transcript_defaults_missing_fields() {
        let transcript: Transcript = serde_json::from_str("{}").unwrap();
        assert!(transcript.language.is_none());
        assert!(transcript.segments.is_empty());
    }

    #[test]
    fn unsupported_pair_is_distinguishable() {
        let err = EngineError::unsupported_pair("te", "ko");
        assert!(err.is_unsupported_pair());
        assert!(err.to_string().contains("'te' to 'ko'"));
        assert!(!EngineError::other("boom").is_unsupported_pair());
    }
}
