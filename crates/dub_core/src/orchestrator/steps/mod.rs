//! Pipeline step implementations.
//!
//! Each step wraps one component and records its result in `JobState`:
//!
//! - `ExtractStep` - decode the input to mono PCM
//! - `TranscribeStep` - recognition, diarization and segment alignment
//! - `ReferencesStep` - per-speaker reference clips
//! - `TranslateStep` - memoized per-segment translation
//! - `SynthesizeStep` - tiered speech synthesis
//! - `AlignTimingStep` - fit clips to their slots
//! - `MixStep` - place clips on the master track

mod extract;
mod mix;
mod references;
mod synthesize;
mod timing;
mod transcribe;
mod translate;

pub use extract::ExtractStep;
pub use mix::MixStep;
pub use references::ReferencesStep;
pub use synthesize::SynthesizeStep;
pub use timing::AlignTimingStep;
pub use transcribe::TranscribeStep;
pub use translate::TranslateStep;

use std::fs;

use serde::Serialize;

use super::errors::{StepError, StepResult};
use super::types::{Context, ExtractOutput, JobState};

/// Write a debugging snapshot into the work directory.
///
/// Only when `output.save_intermediates` is set. A failed write is logged
/// and otherwise ignored.
pub(crate) fn save_intermediate<T: Serialize + ?Sized>(ctx: &Context, file_name: &str, value: &T) {
    if !ctx.settings.output.save_intermediates {
        return;
    }

    let path = ctx.work_dir.join(file_name);
    let written = serde_json::to_string_pretty(value)
        .map_err(|e| e.to_string())
        .and_then(|json| fs::write(&path, json).map_err(|e| e.to_string()));

    match written {
        Ok(()) => ctx.logger.debug(&format!("Saved {}", path.display())),
        Err(e) => ctx
            .logger
            .warn(&format!("Could not save {}: {}", path.display(), e)),
    }
}

/// The Extract output, or a precondition error naming the caller.
pub(crate) fn require_extract<'a>(state: &'a JobState, step: &str) -> StepResult<&'a ExtractOutput> {
    state.extract.as_ref().ok_or_else(|| {
        StepError::precondition_failed(format!("{} needs decoded audio from Extract", step))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orchestrator::fixtures::test_context;
    use tempfile::tempdir;

    #[test]
    fn intermediates_only_when_enabled() {
        let dir = tempdir().unwrap();
        let mut ctx = test_context(dir.path());
        fs::create_dir_all(&ctx.work_dir).unwrap();

        save_intermediate(&ctx, "off.json", &vec![1, 2]);
        assert!(!ctx.work_dir.join("off.json").exists());

        ctx.settings.output.save_intermediates = true;
        save_intermediate(&ctx, "on.json", &vec![1, 2]);
        let text = fs::read_to_string(ctx.work_dir.join("on.json")).unwrap();
        assert!(text.contains('2'));
    }

    #[test]
    fn missing_extract_is_a_precondition_error() {
        let state = JobState::new("job");
        let err = require_extract(&state, "Mix").unwrap_err();
        assert!(matches!(err, StepError::PreconditionFailed(_)));
    }
}
