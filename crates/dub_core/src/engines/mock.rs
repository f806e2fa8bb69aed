//! Scripted engines for unit tests.

use std::f64::consts::PI;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use super::{
    AudioDecoder, Diarizer, EngineError, EngineFactory, EngineResult, EngineSet, LazyEngine,
    SpeakerTurn, SpeechSynthesizer, SynthesisRequest, Transcript, Transcriber, Translator,
};
use crate::audio::{write_wav, AudioData};
use crate::config::Settings;
use crate::synthesis::SynthesisChain;

/// Sine tone used as stand-in speech.
pub fn tone(freq_hz: f64, secs: f64, sample_rate: u32) -> AudioData {
    let n = (secs * sample_rate as f64).round() as usize;
    let samples = (0..n)
        .map(|i| (2.0 * PI * freq_hz * i as f64 / sample_rate as f64).sin() * 0.5)
        .collect();
    AudioData::new(samples, sample_rate)
}

/// Shared call counter.
#[derive(Debug, Clone, Default)]
pub struct Calls(Arc<AtomicUsize>);

impl Calls {
    pub fn bump(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }

    pub fn get(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

/// What a mock synthesizer does when called.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SynthBehavior {
    /// Write a tone of this many seconds.
    Tone(f64),
    /// Return an error.
    Fail,
    /// Report success but leave an empty file.
    Empty,
    /// Write a tone of this many seconds, then return an error.
    Partial(f64),
    /// Report success without touching the output path.
    Silent,
}

pub struct MockSynthesizer {
    pub behavior: SynthBehavior,
    pub calls: Calls,
    /// Voice preset of the most recent call.
    pub last_voice: Arc<Mutex<Option<String>>>,
}

impl MockSynthesizer {
    pub fn new(behavior: SynthBehavior) -> Self {
        Self {
            behavior,
            calls: Calls::default(),
            last_voice: Arc::new(Mutex::new(None)),
        }
    }

    pub fn handle(self, name: &str) -> LazyEngine<Box<dyn SpeechSynthesizer>> {
        LazyEngine::ready(name, Box::new(self) as Box<dyn SpeechSynthesizer>)
    }
}

impl SpeechSynthesizer for MockSynthesizer {
    fn name(&self) -> &str {
        "mock-tts"
    }

    fn synthesize(&mut self, request: &SynthesisRequest<'_>) -> EngineResult<PathBuf> {
        self.calls.bump();
        *self.last_voice.lock() = request.voice.map(str::to_string);
        match self.behavior {
            SynthBehavior::Tone(secs) => {
                write_wav(request.output_path, &tone(200.0, secs, 16000))
                    .map_err(|e| EngineError::other(e.to_string()))?;
            }
            SynthBehavior::Fail => return Err(EngineError::other("synthesis exploded")),
            SynthBehavior::Empty => {
                std::fs::write(request.output_path, b"")
                    .map_err(|e| EngineError::io_error("writing empty clip", e))?;
            }
            SynthBehavior::Partial(secs) => {
                write_wav(request.output_path, &tone(200.0, secs, 16000))
                    .map_err(|e| EngineError::other(e.to_string()))?;
                return Err(EngineError::other("synthesis died mid-write"));
            }
            SynthBehavior::Silent => {}
        }
        Ok(request.output_path.to_path_buf())
    }
}

/// Decoder that writes a fixed buffer regardless of input.
pub struct MockDecoder {
    pub audio: AudioData,
    pub calls: Calls,
}

impl AudioDecoder for MockDecoder {
    fn name(&self) -> &str {
        "mock-decoder"
    }

    fn decode(&mut self, _input: &Path, output: &Path, _sample_rate: u32) -> EngineResult<()> {
        self.calls.bump();
        write_wav(output, &self.audio).map_err(|e| EngineError::other(e.to_string()))
    }
}

pub struct MockDiarizer {
    pub turns: Option<Vec<SpeakerTurn>>,
    pub calls: Calls,
}

impl Diarizer for MockDiarizer {
    fn name(&self) -> &str {
        "mock-diarizer"
    }

    fn diarize(&mut self, _audio: &Path) -> EngineResult<Vec<SpeakerTurn>> {
        self.calls.bump();
        self.turns
            .clone()
            .ok_or_else(|| EngineError::other("diarization model unavailable"))
    }
}

pub struct MockTranscriber {
    pub transcript: Transcript,
    pub calls: Calls,
}

impl Transcriber for MockTranscriber {
    fn name(&self) -> &str {
        "mock-asr"
    }

    fn transcribe(&mut self, _audio: &Path, _language_hint: Option<&str>) -> EngineResult<Transcript> {
        self.calls.bump();
        Ok(self.transcript.clone())
    }
}

/// Translator that tags text with the target language.
pub struct MockTranslator {
    pub unsupported: bool,
    pub calls: Calls,
}

impl Translator for MockTranslator {
    fn name(&self) -> &str {
        "mock-mt"
    }

    fn translate(&mut self, text: &str, source: &str, target: &str) -> EngineResult<String> {
        self.calls.bump();
        if self.unsupported {
            return Err(EngineError::unsupported_pair(source, target));
        }
        Ok(format!("[{}] {}", target, text))
    }
}

/// Counters shared by every engine a [`MockFactory`] creates.
#[derive(Debug, Clone, Default)]
pub struct MockCalls {
    pub created: Calls,
    pub decode: Calls,
    pub diarize: Calls,
    pub transcribe: Calls,
    pub translate: Calls,
    pub synthesize: Calls,
}

impl MockCalls {
    /// Total calls into any engine.
    pub fn engine_calls(&self) -> usize {
        self.decode.get()
            + self.diarize.get()
            + self.transcribe.get()
            + self.translate.get()
            + self.synthesize.get()
    }
}

/// Factory producing scripted engine sets.
#[derive(Debug, Clone)]
pub struct MockFactory {
    pub source: AudioData,
    pub turns: Option<Vec<SpeakerTurn>>,
    pub transcript: Transcript,
    pub unsupported_pair: bool,
    /// Behaviors for tiers A, B and C.
    pub tiers: [SynthBehavior; 3],
    pub calls: MockCalls,
}

impl MockFactory {
    pub fn new(source: AudioData, transcript: Transcript) -> Self {
        Self {
            source,
            turns: None,
            transcript,
            unsupported_pair: false,
            tiers: [
                SynthBehavior::Tone(1.0),
                SynthBehavior::Tone(1.0),
                SynthBehavior::Tone(1.0),
            ],
            calls: MockCalls::default(),
        }
    }

    fn synth(&self, behavior: SynthBehavior, name: &str) -> LazyEngine<Box<dyn SpeechSynthesizer>> {
        let mut synth = MockSynthesizer::new(behavior);
        synth.calls = self.calls.synthesize.clone();
        synth.handle(name)
    }
}

impl EngineFactory for MockFactory {
    fn create(&self, settings: &Settings) -> EngineSet {
        self.calls.created.bump();

        let diarizer = MockDiarizer {
            turns: self.turns.clone(),
            calls: self.calls.diarize.clone(),
        };
        let transcriber = MockTranscriber {
            transcript: self.transcript.clone(),
            calls: self.calls.transcribe.clone(),
        };
        let translator = MockTranslator {
            unsupported: self.unsupported_pair,
            calls: self.calls.translate.clone(),
        };

        EngineSet {
            decoder: Box::new(MockDecoder {
                audio: self.source.clone(),
                calls: self.calls.decode.clone(),
            }),
            diarizer: LazyEngine::ready("diarizer", Box::new(diarizer) as Box<dyn Diarizer>),
            transcriber: LazyEngine::ready(
                "transcriber",
                Box::new(transcriber) as Box<dyn Transcriber>,
            ),
            translator: LazyEngine::ready("translator", Box::new(translator) as Box<dyn Translator>),
            synthesis: SynthesisChain::standard(
                &settings.synthesis,
                self.synth(self.tiers[0], "voice clone"),
                self.synth(self.tiers[1], "neural voice"),
                self.synth(self.tiers[2], "basic"),
            ),
        }
    }
}
