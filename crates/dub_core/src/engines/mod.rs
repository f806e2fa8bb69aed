//! External collaborators: decoding, diarization, recognition,
//! translation and synthesis.
//!
//! The pipeline never talks to a model directly. Each collaborator is a
//! trait; a worker owns one [`EngineSet`] for its whole life and passes it
//! explicitly to every step. Model-backed engines sit behind
//! [`LazyEngine`] so nothing is loaded until a job needs it.
//!
//! [`CommandEngineFactory`] builds a set from the `[engines]` config
//! section, running each collaborator as an external program.

mod command;
mod lazy;
#[cfg(test)]
pub(crate) mod mock;
mod types;

use std::path::{Path, PathBuf};

pub use command::{
    run_command, CommandDiarizer, CommandOutput, CommandSynthesizer, CommandTemplate,
    CommandTranscriber, CommandTranslator, UNSUPPORTED_PAIR_EXIT_CODE,
};
pub use lazy::LazyEngine;
pub use types::{
    EngineError, EngineResult, SpeakerTurn, SynthesisRequest, Transcript, TranscriptSegment,
};

use crate::audio;
use crate::config::Settings;
use crate::synthesis::SynthesisChain;

/// Decodes a media file to mono PCM WAV.
pub trait AudioDecoder: Send {
    fn name(&self) -> &str;

    /// Decode `input` into a WAV at `output` with the given sample rate.
    fn decode(&mut self, input: &Path, output: &Path, sample_rate: u32) -> EngineResult<()>;
}

/// Speaker diarization: who spoke when.
pub trait Diarizer: Send {
    fn name(&self) -> &str;

    fn diarize(&mut self, audio: &Path) -> EngineResult<Vec<SpeakerTurn>>;
}

/// Speech recognition: what was said when, and in which language.
pub trait Transcriber: Send {
    fn name(&self) -> &str;

    /// `language_hint` is `None` to auto-detect.
    fn transcribe(&mut self, audio: &Path, language_hint: Option<&str>) -> EngineResult<Transcript>;
}

/// Machine translation of one segment's text.
///
/// Must return [`EngineError::UnsupportedLanguagePair`] when it cannot
/// translate between the two languages.
pub trait Translator: Send {
    fn name(&self) -> &str;

    fn translate(&mut self, text: &str, source: &str, target: &str) -> EngineResult<String>;
}

/// Text-to-speech. Writes a WAV and returns its path.
pub trait SpeechSynthesizer: Send {
    fn name(&self) -> &str;

    fn synthesize(&mut self, request: &SynthesisRequest<'_>) -> EngineResult<PathBuf>;
}

/// Boxed diarizer handle.
pub type DiarizerHandle = LazyEngine<Box<dyn Diarizer>>;
/// Boxed recognizer handle.
pub type TranscriberHandle = LazyEngine<Box<dyn Transcriber>>;
/// Boxed translator handle.
pub type TranslatorHandle = LazyEngine<Box<dyn Translator>>;
/// Boxed synthesizer handle.
pub type SynthesizerHandle = LazyEngine<Box<dyn SpeechSynthesizer>>;

/// Every collaborator one worker needs, owned by that worker.
pub struct EngineSet {
    pub decoder: Box<dyn AudioDecoder>,
    pub diarizer: DiarizerHandle,
    pub transcriber: TranscriberHandle,
    pub translator: TranslatorHandle,
    pub synthesis: SynthesisChain,
}

/// Builds a fresh [`EngineSet`] for each worker.
pub trait EngineFactory: Send + Sync {
    fn create(&self, settings: &Settings) -> EngineSet;
}

/// Default decoder: FFmpeg subprocess.
#[derive(Debug, Default, Clone, Copy)]
pub struct FfmpegDecoder;

impl AudioDecoder for FfmpegDecoder {
    fn name(&self) -> &str {
        "ffmpeg"
    }

    fn decode(&mut self, input: &Path, output: &Path, sample_rate: u32) -> EngineResult<()> {
        audio::decode_to_wav(input, output, sample_rate).map_err(|e| match e {
            audio::AudioError::IoError(source) => EngineError::io_error("decoding input", source),
            other => EngineError::other(other.to_string()),
        })
    }
}

/// Builds engines from the `[engines]` config section.
#[derive(Debug, Default, Clone, Copy)]
pub struct CommandEngineFactory;

impl CommandEngineFactory {
    fn lazy<T, F>(name: &str, argv: &[String], build: F) -> LazyEngine<T>
    where
        T: 'static,
        F: FnOnce(CommandTemplate) -> T + Send + 'static,
    {
        match CommandTemplate::new(argv) {
            Some(template) => LazyEngine::new(name, move || Ok(build(template))),
            None => LazyEngine::unavailable(name, EngineError::not_configured(name).to_string()),
        }
    }
}

impl EngineFactory for CommandEngineFactory {
    fn create(&self, settings: &Settings) -> EngineSet {
        let engines = &settings.engines;

        let diarizer = Self::lazy("diarizer", &engines.diarization, |t| {
            Box::new(CommandDiarizer::new(t)) as Box<dyn Diarizer>
        });
        let transcriber = Self::lazy("transcriber", &engines.transcription, |t| {
            Box::new(CommandTranscriber::new(t)) as Box<dyn Transcriber>
        });
        let translator = Self::lazy("translator", &engines.translation, |t| {
            Box::new(CommandTranslator::new(t)) as Box<dyn Translator>
        });
        let voice_clone = Self::lazy("voice clone synthesizer", &engines.voice_clone, |t| {
            Box::new(CommandSynthesizer::new(t)) as Box<dyn SpeechSynthesizer>
        });
        let neural_voice = Self::lazy("neural voice synthesizer", &engines.neural_voice, |t| {
            Box::new(CommandSynthesizer::new(t)) as Box<dyn SpeechSynthesizer>
        });
        let basic_voice = Self::lazy("basic synthesizer", &engines.basic_voice, |t| {
            Box::new(CommandSynthesizer::new(t)) as Box<dyn SpeechSynthesizer>
        });

        EngineSet {
            decoder: Box::new(FfmpegDecoder),
            diarizer,
            transcriber,
            translator,
            synthesis: SynthesisChain::standard(
                &settings.synthesis,
                voice_clone,
                neural_voice,
                basic_voice,
            ),
        }
    }
}
