//! Core types for the dubbing pipeline.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::config::Settings;
use crate::logging::JobLogger;
use crate::mixer::MixReport;
use crate::models::{JobRequest, JobStage, MixPolicy, Segment, SynthesisTier};
use crate::references::SpeakerReferences;
use crate::synthesis::{BatchReport, SpeakerVoice};
use crate::timing::TimingReport;

/// One progress report, emitted at step boundaries.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressUpdate {
    pub step: String,
    pub stage: JobStage,
    pub percent: u32,
    pub message: String,
}

/// Progress callback type for reporting pipeline progress.
pub type ProgressCallback = Box<dyn Fn(&ProgressUpdate) + Send + Sync>;

/// Read-only context passed to pipeline steps.
///
/// Contains the request and shared resources that steps can read but not
/// modify. Mutable state goes in `JobState`.
pub struct Context {
    pub request: JobRequest,
    pub settings: Settings,
    pub job_id: String,
    /// Job-specific working directory (under temp_root).
    pub work_dir: PathBuf,
    /// Output directory for the dubbed file.
    pub output_dir: PathBuf,
    pub logger: Arc<JobLogger>,
    progress_callback: Option<ProgressCallback>,
}

impl Context {
    pub fn new(
        request: JobRequest,
        settings: Settings,
        job_id: impl Into<String>,
        work_dir: PathBuf,
        output_dir: PathBuf,
        logger: Arc<JobLogger>,
    ) -> Self {
        Self {
            request,
            settings,
            job_id: job_id.into(),
            work_dir,
            output_dir,
            logger,
            progress_callback: None,
        }
    }

    pub fn with_progress_callback(mut self, callback: ProgressCallback) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    /// Report progress to callback (if set).
    pub fn report_progress(&self, step: &str, stage: JobStage, percent: u32, message: &str) {
        if let Some(ref callback) = self.progress_callback {
            callback(&ProgressUpdate {
                step: step.to_string(),
                stage,
                percent,
                message: message.to_string(),
            });
        }
    }

    /// Working sample rate for every intermediate file.
    pub fn sample_rate(&self) -> u32 {
        self.settings.audio.sample_rate
    }

    /// Normalized target language.
    pub fn target_lang(&self) -> String {
        self.request.target()
    }

    /// Where the dubbed track is written.
    pub fn output_path(&self) -> PathBuf {
        self.request.output_path.clone().unwrap_or_else(|| {
            self.output_dir
                .join(format!("dubbed_{}_{}.wav", self.job_id, self.target_lang()))
        })
    }
}

/// Mutable job state that accumulates results from pipeline steps.
///
/// Each step's output is stored in its own section. `segments` is the
/// single list every stage after Transcribe fills in.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobState {
    pub job_id: String,
    pub started_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extract: Option<ExtractOutput>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transcription: Option<TranscriptionOutput>,
    #[serde(default)]
    pub segments: Vec<Segment>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub references: Option<SpeakerReferences>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub translation: Option<TranslationOutput>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub synthesis: Option<BatchReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timing: Option<TimingReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mix: Option<MixOutput>,
}

impl JobState {
    pub fn new(job_id: impl Into<String>) -> Self {
        Self {
            job_id: job_id.into(),
            started_at: Some(chrono::Local::now().to_rfc3339()),
            ..Default::default()
        }
    }

    pub fn has_extraction(&self) -> bool {
        self.extract.is_some()
    }

    pub fn has_transcription(&self) -> bool {
        self.transcription.is_some()
    }

    /// References built for this job, or an empty map.
    pub fn references(&self) -> SpeakerReferences {
        self.references.clone().unwrap_or_default()
    }
}

/// Output from the Extract step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractOutput {
    /// Decoded mono WAV of the input.
    pub audio_path: PathBuf,
    pub duration_secs: f64,
    pub sample_rate: u32,
}

/// Output from the Transcribe step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptionOutput {
    /// Language reported by the recognizer (or the forced source).
    pub detected_language: String,
    pub speakers: Vec<String>,
    /// Diarization failed or found nobody; everything went to one speaker.
    pub diarization_fallback: bool,
    pub segment_count: usize,
}

/// Output from the Translate step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslationOutput {
    pub translated: usize,
    /// Distinct non-blank texts sent to the translator.
    pub unique_texts: usize,
    pub cache_hits: usize,
}

/// Output from the Mix step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MixOutput {
    pub output_path: PathBuf,
    pub report: MixReport,
}

/// Summary of a finished job, kept on the job record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detected_language: Option<String>,
    pub segments: usize,
    pub voices: BTreeMap<String, SpeakerVoice>,
    pub tier_counts: BTreeMap<SynthesisTier, usize>,
    pub failed_segments: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mix_policy: Option<MixPolicy>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_duration_secs: Option<f64>,
}

impl JobMetadata {
    pub fn from_state(state: &JobState) -> Self {
        let mut metadata = Self {
            detected_language: state
                .transcription
                .as_ref()
                .map(|t| t.detected_language.clone()),
            segments: state.segments.len(),
            ..Default::default()
        };

        if let Some(synthesis) = &state.synthesis {
            metadata.voices = synthesis.voices.clone();
            metadata.tier_counts = synthesis.tier_counts.clone();
            metadata.failed_segments = synthesis.failed();
        }
        if let Some(mix) = &state.mix {
            metadata.mix_policy = Some(mix.report.policy);
            metadata.output_duration_secs = Some(mix.report.total_duration);
        }

        metadata
    }
}

/// Result of executing a pipeline step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    /// Step completed successfully.
    Success,
    /// Step was skipped (nothing to do, but not an error).
    Skipped(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn job_state_tracks_completion() {
        let mut state = JobState::new("dub-123");
        assert!(!state.has_extraction());
        assert!(state.started_at.is_some());

        state.extract = Some(ExtractOutput {
            audio_path: PathBuf::from("/tmp/source.wav"),
            duration_secs: 4.0,
            sample_rate: 16000,
        });

        assert!(state.has_extraction());
        assert!(state.references().is_empty());
    }

    #[test]
    fn job_state_serializes() {
        let state = JobState::new("dub-456");
        let json = serde_json::to_string(&state).unwrap();
        assert!(json.contains("\"job_id\":\"dub-456\""));
        assert!(!json.contains("\"mix\""));
    }

    #[test]
    fn metadata_collects_step_outputs() {
        let mut state = JobState::new("dub-789");
        state.transcription = Some(TranscriptionOutput {
            detected_language: "en".to_string(),
            speakers: vec!["S1".to_string()],
            diarization_fallback: true,
            segment_count: 2,
        });
        let mut batch = BatchReport::default();
        batch.tier_counts.insert(SynthesisTier::Basic, 2);
        state.synthesis = Some(batch);

        let metadata = JobMetadata::from_state(&state);
        assert_eq!(metadata.detected_language.as_deref(), Some("en"));
        assert_eq!(metadata.tier_counts.get(&SynthesisTier::Basic), Some(&2));
        assert!(metadata.mix_policy.is_none());
    }
}
