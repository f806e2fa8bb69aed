//! Shared fixtures for orchestrator and job tests.

use std::path::Path;
use std::sync::Arc;

use crate::audio::AudioData;
use crate::config::Settings;
use crate::engines::mock::{tone, MockFactory};
use crate::engines::{EngineFactory, EngineSet, SpeakerTurn, Transcript, TranscriptSegment};
use crate::logging::{JobLogger, LogConfig};
use crate::models::JobRequest;

use super::types::Context;

pub const RATE: u32 = 16000;

/// Settings whose folders all live under `dir`.
pub fn test_settings(dir: &Path) -> Settings {
    let mut settings = Settings::default();
    settings.paths.output_folder = dir.join("out").to_string_lossy().to_string();
    settings.paths.temp_root = dir.join("work").to_string_lossy().to_string();
    settings.paths.logs_folder = dir.join("logs").to_string_lossy().to_string();
    settings.audio.sample_rate = RATE;
    settings
}

/// A 6 s, two-speaker English recording.
pub fn sample_factory() -> MockFactory {
    let source = AudioData::new(
        [tone(120.0, 3.0, RATE).samples, tone(220.0, 3.0, RATE).samples].concat(),
        RATE,
    );
    let transcript = Transcript {
        language: Some("en".to_string()),
        segments: vec![
            TranscriptSegment::new(0.0, 2.5, "Hello there."),
            TranscriptSegment::new(3.0, 5.5, "Hi, how are you?"),
        ],
    };
    let mut factory = MockFactory::new(source, transcript);
    factory.turns = Some(vec![
        SpeakerTurn::new("S1", 0.0, 2.8),
        SpeakerTurn::new("S2", 2.8, 6.0),
    ]);
    factory
}

/// Writes a placeholder input file and returns an en → es request for it.
pub fn sample_request(dir: &Path) -> JobRequest {
    let input = dir.join("input.mp4");
    std::fs::write(&input, b"not really media").unwrap();
    JobRequest::new(input, "es").with_source("en")
}

pub fn test_context(dir: &Path) -> Context {
    let settings = test_settings(dir);
    let logger = JobLogger::new("test_job", dir.join("logs"), LogConfig::default(), None).unwrap();
    Context::new(
        sample_request(dir),
        settings,
        "test_job",
        dir.join("work").join("test_job"),
        dir.join("out"),
        Arc::new(logger),
    )
}

pub fn test_engines() -> EngineSet {
    sample_factory().create(&Settings::default())
}
