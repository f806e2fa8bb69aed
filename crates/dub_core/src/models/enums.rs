//! Core enums used throughout the application.

use serde::{Deserialize, Serialize};

/// Synthesis tier that produced a segment's audio.
///
/// Tiers are ordered by preference: a voice clone of the original speaker
/// first, then a preset voice matched on gender, then plain synthesis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SynthesisTier {
    /// Tier A: cloned from the speaker's reference clip.
    VoiceClone,
    /// Tier B: preset neural voice matched on the speaker's gender.
    MatchedVoice,
    /// Tier C: basic synthesis without any voice matching.
    Basic,
}

impl SynthesisTier {
    /// All tiers in fallback order.
    pub const ALL: [SynthesisTier; 3] = [
        SynthesisTier::VoiceClone,
        SynthesisTier::MatchedVoice,
        SynthesisTier::Basic,
    ];

    /// Short tier letter used in logs.
    pub fn letter(&self) -> char {
        match self {
            SynthesisTier::VoiceClone => 'A',
            SynthesisTier::MatchedVoice => 'B',
            SynthesisTier::Basic => 'C',
        }
    }
}

impl std::fmt::Display for SynthesisTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SynthesisTier::VoiceClone => write!(f, "voice clone"),
            SynthesisTier::MatchedVoice => write!(f, "matched voice"),
            SynthesisTier::Basic => write!(f, "basic"),
        }
    }
}

/// Speaker gender as estimated from pitch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    #[default]
    Male,
    Female,
}

impl std::fmt::Display for Gender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Gender::Male => write!(f, "male"),
            Gender::Female => write!(f, "female"),
        }
    }
}

/// How the timeline mixer places clips on the master track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MixPolicy {
    /// Each clip is trimmed or padded to its original slot and overlaid at
    /// the segment start. Output length matches the source exactly.
    #[default]
    FixedSlot,
    /// Clips are appended in start order and pushed later when they would
    /// collide with the previous clip. Audio is never truncated.
    Sequential,
}

impl std::fmt::Display for MixPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MixPolicy::FixedSlot => write!(f, "fixed_slot"),
            MixPolicy::Sequential => write!(f, "sequential"),
        }
    }
}

/// What the timing aligner does after the speed change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimingMode {
    /// Pad with silence or trim so the clip matches its slot exactly.
    #[default]
    Fit,
    /// Apply the clamped speed change only; the mixer handles the rest.
    Defer,
}

impl std::fmt::Display for TimingMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TimingMode::Fit => write!(f, "fit"),
            TimingMode::Defer => write!(f, "defer"),
        }
    }
}

/// Coarse job stage, in pipeline order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStage {
    #[default]
    Received,
    Transcribing,
    Translating,
    Synthesizing,
    Mixing,
    Completed,
    Failed,
}

impl JobStage {
    /// Whether the job has stopped.
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStage::Completed | JobStage::Failed)
    }
}

impl std::fmt::Display for JobStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            JobStage::Received => "received",
            JobStage::Transcribing => "transcribing",
            JobStage::Translating => "translating",
            JobStage::Synthesizing => "synthesizing",
            JobStage::Mixing => "mixing",
            JobStage::Completed => "completed",
            JobStage::Failed => "failed",
        };
        write!(f, "{}", name)
    }
}
