//! Supported language table and request validation.

use std::path::Path;

use thiserror::Error;

/// Source language value that asks the recognizer to detect the language.
pub const AUTO_DETECT: &str = "auto";

/// Languages the pipeline accepts, as `(code, display name)`.
pub const SUPPORTED_LANGUAGES: &[(&str, &str)] = &[
    ("en", "English"),
    ("hi", "Hindi"),
    ("te", "Telugu"),
    ("es", "Spanish"),
    ("fr", "French"),
    ("de", "German"),
    ("it", "Italian"),
    ("pt", "Portuguese"),
    ("pl", "Polish"),
    ("tr", "Turkish"),
    ("ru", "Russian"),
    ("nl", "Dutch"),
    ("cs", "Czech"),
    ("ar", "Arabic"),
    ("zh-cn", "Chinese"),
    ("ja", "Japanese"),
    ("ko", "Korean"),
];

/// Request rejected before any work starts.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Target language '{code}' not supported. Choose from: {choices}")]
    UnsupportedTarget { code: String, choices: String },

    #[error("Source language '{code}' not supported. Use 'auto' or one of: {choices}")]
    UnsupportedSource { code: String, choices: String },

    #[error("Source and target language are both '{0}'; nothing to dub")]
    SameLanguage(String),

    #[error("Input file not found: {0}")]
    InputNotFound(String),
}

/// Normalize a language code for lookup (`ZH-CN` → `zh-cn`, `zh_CN` → `zh-cn`).
pub fn normalize_code(code: &str) -> String {
    code.trim().to_lowercase().replace('_', "-")
}

/// Whether a language code is in the supported table.
pub fn is_supported(code: &str) -> bool {
    let code = normalize_code(code);
    SUPPORTED_LANGUAGES.iter().any(|(c, _)| *c == code)
}

/// Display name for a supported language code.
pub fn language_name(code: &str) -> Option<&'static str> {
    let code = normalize_code(code);
    SUPPORTED_LANGUAGES
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, name)| *name)
}

/// Resolve a source-language request: `auto` (or empty) means detect.
pub fn source_hint(source: &str) -> Option<String> {
    let code = normalize_code(source);
    if code.is_empty() || code == AUTO_DETECT {
        None
    } else {
        Some(code)
    }
}

/// Check that the codes can be dubbed and the input exists.
///
/// Runs before any engine is created so invalid requests cost nothing.
pub fn validate_request(source: &str, target: &str, input: &Path) -> Result<(), ValidationError> {
    let target = normalize_code(target);
    if !is_supported(&target) {
        return Err(ValidationError::UnsupportedTarget {
            code: target,
            choices: choices(),
        });
    }

    if let Some(source) = source_hint(source) {
        if !is_supported(&source) {
            return Err(ValidationError::UnsupportedSource {
                code: source,
                choices: choices(),
            });
        }
        if source == target {
            return Err(ValidationError::SameLanguage(source));
        }
    }

    if !input.is_file() {
        return Err(ValidationError::InputNotFound(input.display().to_string()));
    }

    Ok(())
}

fn choices() -> String {
    SUPPORTED_LANGUAGES
        .iter()
        .map(|(c, _)| *c)
        .collect::<Vec<_>>()
        .join(", ")
}
