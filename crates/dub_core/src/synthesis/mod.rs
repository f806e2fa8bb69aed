//! Synthesis fallback chain.
//!
//! Every segment is voiced by the first tier that succeeds:
//!
//! | Tier | Strategy            | Needs                              |
//! |------|---------------------|------------------------------------|
//! | A    | [`VoiceCloneTier`]  | the speaker's reference clip       |
//! | B    | [`MatchedVoiceTier`]| a preset voice for language/gender |
//! | C    | [`BasicTier`]       | nothing                            |
//!
//! Each tier is tried at most once per segment. A tier's output only counts
//! when the file it reports exists and is non-empty.

mod chain;
mod tiers;
mod voices;

pub use chain::{BatchReport, SegmentOutcome, SegmentReport, SpeakerVoice, SynthesisChain};
pub use tiers::{BasicTier, MatchedVoiceTier, VoiceCloneTier};
pub use voices::{preset_voice, VOICE_PRESETS};

use std::path::{Path, PathBuf};

use crate::engines::EngineResult;
use crate::models::SynthesisTier;

/// Inputs for one tier attempt.
#[derive(Debug, Clone, Copy)]
pub struct TierRequest<'a> {
    /// Text to speak.
    pub text: &'a str,
    /// Target language code.
    pub language: &'a str,
    /// Resolved voice for the segment's speaker.
    pub voice: &'a SpeakerVoice,
    /// Where the clip should be written.
    pub output_path: &'a Path,
}

/// One synthesis tier.
pub trait SynthesisStrategy: Send {
    /// Which tier this strategy implements.
    fn tier(&self) -> SynthesisTier;

    /// Whether the tier can be tried at all for this request.
    ///
    /// Inapplicable tiers are skipped without counting as a failure.
    fn applicable(&self, _request: &TierRequest<'_>) -> bool {
        true
    }

    /// Produce a clip and return its path.
    fn attempt(&mut self, request: &TierRequest<'_>) -> EngineResult<PathBuf>;
}
