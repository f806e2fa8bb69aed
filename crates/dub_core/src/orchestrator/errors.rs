//! Error types for the dubbing pipeline.
//!
//! Errors carry context that chains through layers:
//! Job → Step → Engine/Audio → Detail

use std::io;

use thiserror::Error;

use crate::audio::AudioError;
use crate::engines::EngineError;
use crate::models::ValidationError;

/// Top-level pipeline error with job context.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// A step failed during execution.
    #[error("Job '{job_name}' failed at step '{step_name}': {source}")]
    StepFailed {
        job_name: String,
        step_name: String,
        #[source]
        source: StepError,
    },

    /// The request was rejected before the pipeline started.
    #[error("Job '{job_name}' failed validation: {source}")]
    ValidationFailed {
        job_name: String,
        #[source]
        source: ValidationError,
    },

    /// Failed to set up job (create directories, etc.).
    #[error("Job '{job_name}' setup failed: {message}")]
    SetupFailed { job_name: String, message: String },
}

impl PipelineError {
    pub fn step_failed(
        job_name: impl Into<String>,
        step_name: impl Into<String>,
        source: StepError,
    ) -> Self {
        Self::StepFailed {
            job_name: job_name.into(),
            step_name: step_name.into(),
            source,
        }
    }

    pub fn validation_failed(job_name: impl Into<String>, source: ValidationError) -> Self {
        Self::ValidationFailed {
            job_name: job_name.into(),
            source,
        }
    }

    pub fn setup_failed(job_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SetupFailed {
            job_name: job_name.into(),
            message: message.into(),
        }
    }

    /// Message shown to the caller for a failed job.
    ///
    /// Validation failures surface the bare validation message; step
    /// failures keep the step name for context.
    pub fn user_message(&self) -> String {
        match self {
            Self::ValidationFailed { source, .. } => source.to_string(),
            Self::StepFailed {
                step_name, source, ..
            } => match source {
                StepError::Validation(inner) => inner.to_string(),
                other => format!("{} failed: {}", step_name, other),
            },
            Self::SetupFailed { message, .. } => message.clone(),
        }
    }
}

/// Error from a pipeline step with operation context.
#[derive(Error, Debug)]
pub enum StepError {
    /// Output validation failed.
    #[error("Output validation failed: {0}")]
    InvalidOutput(String),

    /// File I/O error.
    #[error("I/O error in {operation}: {source}")]
    IoError {
        operation: String,
        #[source]
        source: io::Error,
    },

    /// A required file was not found.
    #[error("Required file not found: {path}")]
    FileNotFound { path: String },

    /// A precondition was not met.
    #[error("Precondition not met: {0}")]
    PreconditionFailed(String),

    /// An external collaborator failed.
    #[error("{engine}: {source}")]
    Engine {
        engine: String,
        #[source]
        source: EngineError,
    },

    /// Audio decode/encode/processing failed.
    #[error(transparent)]
    Audio(#[from] AudioError),

    /// Request turned out invalid mid-run (e.g. detected language equals target).
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Generic step error with message.
    #[error("{0}")]
    Other(String),
}

impl StepError {
    pub fn invalid_output(message: impl Into<String>) -> Self {
        Self::InvalidOutput(message.into())
    }

    pub fn io_error(operation: impl Into<String>, source: io::Error) -> Self {
        Self::IoError {
            operation: operation.into(),
            source,
        }
    }

    pub fn file_not_found(path: impl Into<String>) -> Self {
        Self::FileNotFound { path: path.into() }
    }

    pub fn precondition_failed(message: impl Into<String>) -> Self {
        Self::PreconditionFailed(message.into())
    }

    /// Wrap a collaborator error with the engine's name.
    pub fn engine(engine: impl Into<String>, source: EngineError) -> Self {
        Self::Engine {
            engine: engine.into(),
            source,
        }
    }

    pub fn other(message: impl Into<String>) -> Self {
        Self::Other(message.into())
    }
}

/// Result type for step operations.
pub type StepResult<T> = Result<T, StepError>;

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_error_keeps_context() {
        let err = StepError::engine("translator", EngineError::unsupported_pair("en", "xx"));
        let msg = err.to_string();
        assert!(msg.contains("translator"));
        assert!(msg.contains("'en' to 'xx'"));
    }

    #[test]
    fn pipeline_error_chains_context() {
        let step_err = StepError::file_not_found("/tmp/source.wav");
        let pipeline_err = PipelineError::step_failed("dub_1234", "Extract", step_err);

        let msg = pipeline_err.to_string();
        assert!(msg.contains("dub_1234"));
        assert!(msg.contains("Extract"));
    }

    #[test]
    fn validation_message_is_verbatim() {
        let err = PipelineError::step_failed(
            "dub_1",
            "Transcribe",
            ValidationError::SameLanguage("en".to_string()).into(),
        );
        assert_eq!(
            err.user_message(),
            ValidationError::SameLanguage("en".to_string()).to_string()
        );

        let err = PipelineError::step_failed("dub_1", "Synthesize", StepError::other("no audio"));
        assert_eq!(err.user_message(), "Synthesize failed: no audio");

        let err = PipelineError::validation_failed(
            "dub_1",
            ValidationError::SameLanguage("en".to_string()),
        );
        assert!(err.to_string().contains("dub_1"));
        assert_eq!(
            err.user_message(),
            ValidationError::SameLanguage("en".to_string()).to_string()
        );
        assert_eq!(
            PipelineError::setup_failed("dub_1", "disk full").user_message(),
            "disk full"
        );
    }
}
