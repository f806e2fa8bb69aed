//! Dubbing job request.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::language::{normalize_code, source_hint, validate_request, ValidationError, AUTO_DETECT};

/// What to dub, from which language, into which language.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRequest {
    /// Input media (any format FFmpeg can decode).
    pub input_path: PathBuf,
    /// Source language code, or `auto` to detect.
    #[serde(default = "default_source")]
    pub source_lang: String,
    /// Target language code.
    pub target_lang: String,
    /// Output file; defaults to `dubbed_<job_id>_<target>.wav` in the output folder.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_path: Option<PathBuf>,
}

fn default_source() -> String {
    AUTO_DETECT.to_string()
}

impl JobRequest {
    /// Request with auto-detected source language.
    pub fn new(input_path: impl Into<PathBuf>, target_lang: impl Into<String>) -> Self {
        Self {
            input_path: input_path.into(),
            source_lang: default_source(),
            target_lang: normalize_code(&target_lang.into()),
            output_path: None,
        }
    }

    pub fn with_source(mut self, source_lang: impl Into<String>) -> Self {
        self.source_lang = normalize_code(&source_lang.into());
        self
    }

    pub fn with_output(mut self, output_path: impl Into<PathBuf>) -> Self {
        self.output_path = Some(output_path.into());
        self
    }

    /// Source hint for the recognizer; `None` means detect.
    pub fn source_hint(&self) -> Option<String> {
        source_hint(&self.source_lang)
    }

    /// Normalized target language code.
    pub fn target(&self) -> String {
        normalize_code(&self.target_lang)
    }

    /// Check languages and input before any work starts.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_request(&self.source_lang, &self.target_lang, &self.input_path)
    }
}
