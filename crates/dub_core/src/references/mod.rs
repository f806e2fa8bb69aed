//! Per-speaker voice reference clips.
//!
//! The voice-clone tier needs a short sample of each speaker. The selector
//! picks the speaker's longest segments, slices them out of the decoded
//! source in memory and joins them into one WAV per speaker.

mod selector;

pub use selector::{build_references, select_clips, ClipSpan};
pub(crate) use selector::file_stem_for;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::config::ReferenceSettings;

/// A speaker's reference clip on disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeakerReference {
    pub speaker_id: String,
    /// Mono WAV at the decode sample rate.
    pub path: PathBuf,
    /// Length of the written clip, gaps included.
    pub duration_secs: f64,
    /// Number of source segments it was cut from.
    pub clip_count: usize,
}

/// Speaker id to reference. A missing key means no reference is available.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SpeakerReferences(BTreeMap<String, SpeakerReference>);

impl SpeakerReferences {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, reference: SpeakerReference) {
        self.0.insert(reference.speaker_id.clone(), reference);
    }

    pub fn get(&self, speaker_id: &str) -> Option<&SpeakerReference> {
        self.0.get(speaker_id)
    }

    /// Reference path for a speaker, if any.
    pub fn path_for(&self, speaker_id: &str) -> Option<&Path> {
        self.0.get(speaker_id).map(|r| r.path.as_path())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SpeakerReference> {
        self.0.values()
    }
}

/// Configuration for reference selection.
#[derive(Debug, Clone)]
pub struct ReferenceConfig {
    /// Maximum segments combined per speaker.
    pub max_clips: usize,
    /// Segments shorter than this are only used as a last resort.
    pub min_clip_secs: f64,
    /// Stop adding clips once this much audio is collected.
    pub target_secs: f64,
    /// Hard cap on the summed clip length.
    pub max_total_secs: f64,
    /// Silence between joined clips.
    pub clip_gap_secs: f64,
}

impl Default for ReferenceConfig {
    fn default() -> Self {
        Self {
            max_clips: 3,
            min_clip_secs: 2.0,
            target_secs: 12.0,
            max_total_secs: 15.0,
            clip_gap_secs: 0.2,
        }
    }
}

impl From<&ReferenceSettings> for ReferenceConfig {
    fn from(settings: &ReferenceSettings) -> Self {
        Self {
            max_clips: settings.max_clips.max(1),
            min_clip_secs: settings.min_clip_secs.max(0.0),
            target_secs: settings.target_secs,
            max_total_secs: settings.max_total_secs,
            clip_gap_secs: settings.clip_gap_secs.max(0.0),
        }
    }
}
