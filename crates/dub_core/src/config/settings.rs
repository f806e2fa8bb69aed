//! Settings struct with TOML-based sections.
//!
//! Settings are organized into logical sections that map to TOML tables.
//! Each section can be updated independently for atomic section-level updates.

use serde::{Deserialize, Serialize};

use crate::models::{MixPolicy, TimingMode};

/// Root settings structure containing all configuration sections.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    /// Path-related settings.
    #[serde(default)]
    pub paths: PathSettings,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingSettings,

    /// Decode settings.
    #[serde(default)]
    pub audio: AudioSettings,

    /// Speaker/transcript alignment.
    #[serde(default)]
    pub alignment: AlignmentSettings,

    /// Reference clip selection.
    #[serde(default)]
    pub references: ReferenceSettings,

    /// Synthesis fallback chain.
    #[serde(default)]
    pub synthesis: SynthesisSettings,

    /// Duration matching.
    #[serde(default)]
    pub timing: TimingSettings,

    /// Timeline mixing.
    #[serde(default)]
    pub mixer: MixerSettings,

    /// Output files.
    #[serde(default)]
    pub output: OutputSettings,

    /// External engine commands.
    #[serde(default)]
    pub engines: EngineSettings,
}

/// Path configuration for output, temp, and logs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathSettings {
    /// Output folder for dubbed files.
    #[serde(default = "default_output_folder")]
    pub output_folder: String,

    /// Root folder for per-job working files.
    #[serde(default = "default_temp_root")]
    pub temp_root: String,

    /// Folder for log files.
    #[serde(default = "default_logs_folder")]
    pub logs_folder: String,
}

fn default_output_folder() -> String {
    "dub_output".to_string()
}

fn default_temp_root() -> String {
    ".temp".to_string()
}

fn default_logs_folder() -> String {
    ".logs".to_string()
}

impl Default for PathSettings {
    fn default() -> Self {
        Self {
            output_folder: default_output_folder(),
            temp_root: default_temp_root(),
            logs_folder: default_logs_folder(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Use compact log format.
    #[serde(default = "default_true")]
    pub compact: bool,

    /// Number of error lines to show in tail.
    #[serde(default = "default_error_tail")]
    pub error_tail: u32,

    /// Progress update step percentage.
    #[serde(default = "default_progress_step")]
    pub progress_step: u32,

    /// Write per-segment detail lines to the job log.
    #[serde(default)]
    pub verbose_segments: bool,
}

fn default_true() -> bool {
    true
}

fn default_error_tail() -> u32 {
    20
}

fn default_progress_step() -> u32 {
    20
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            compact: true,
            error_tail: default_error_tail(),
            progress_step: default_progress_step(),
            verbose_segments: false,
        }
    }
}

/// Decode settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioSettings {
    /// Sample rate the source is decoded to and the master is written at.
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,
}

fn default_sample_rate() -> u32 {
    16000
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self {
            sample_rate: default_sample_rate(),
        }
    }
}

/// Speaker/transcript alignment settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlignmentSettings {
    /// Same-speaker segments closer than this merge (seconds).
    #[serde(default = "default_merge_gap")]
    pub merge_gap_secs: f64,

    /// Speaker label used when diarization yields nothing.
    #[serde(default = "default_speaker_id")]
    pub default_speaker: String,
}

fn default_merge_gap() -> f64 {
    0.5
}

fn default_speaker_id() -> String {
    "S1".to_string()
}

impl Default for AlignmentSettings {
    fn default() -> Self {
        Self {
            merge_gap_secs: default_merge_gap(),
            default_speaker: default_speaker_id(),
        }
    }
}

/// Reference clip selection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReferenceSettings {
    /// Maximum number of segments combined per speaker.
    #[serde(default = "default_max_clips")]
    pub max_clips: usize,

    /// Segments shorter than this are only used as a last resort (seconds).
    #[serde(default = "default_min_clip")]
    pub min_clip_secs: f64,

    /// Stop adding clips once this much audio is collected (seconds).
    #[serde(default = "default_target_total")]
    pub target_secs: f64,

    /// Hard cap on reference length (seconds).
    #[serde(default = "default_max_total")]
    pub max_total_secs: f64,

    /// Silence inserted between joined clips (seconds).
    #[serde(default = "default_clip_gap")]
    pub clip_gap_secs: f64,
}

fn default_max_clips() -> usize {
    3
}

fn default_min_clip() -> f64 {
    2.0
}

fn default_target_total() -> f64 {
    12.0
}

fn default_max_total() -> f64 {
    15.0
}

fn default_clip_gap() -> f64 {
    0.2
}

impl Default for ReferenceSettings {
    fn default() -> Self {
        Self {
            max_clips: default_max_clips(),
            min_clip_secs: default_min_clip(),
            target_secs: default_target_total(),
            max_total_secs: default_max_total(),
            clip_gap_secs: default_clip_gap(),
        }
    }
}

/// Synthesis fallback chain settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SynthesisSettings {
    /// Mean F0 above this is classified female (Hz).
    #[serde(default = "default_gender_threshold")]
    pub gender_threshold_hz: f64,

    /// Try the voice-clone tier when a reference exists.
    #[serde(default = "default_true")]
    pub enable_voice_clone: bool,

    /// Try the gender-matched preset voice tier.
    #[serde(default = "default_true")]
    pub enable_matched_voice: bool,
}

fn default_gender_threshold() -> f64 {
    165.0
}

impl Default for SynthesisSettings {
    fn default() -> Self {
        Self {
            gender_threshold_hz: default_gender_threshold(),
            enable_voice_clone: true,
            enable_matched_voice: true,
        }
    }
}

/// Duration matching settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimingSettings {
    /// Whether clips are padded/trimmed to their slot after the speed change.
    #[serde(default)]
    pub mode: TimingMode,

    /// Lowest playback speed factor.
    #[serde(default = "default_min_speed")]
    pub min_speed: f64,

    /// Highest playback speed factor.
    #[serde(default = "default_max_speed")]
    pub max_speed: f64,

    /// Clips within this many seconds of their slot are left alone.
    #[serde(default = "default_tolerance")]
    pub tolerance_secs: f64,
}

fn default_min_speed() -> f64 {
    0.8
}

fn default_max_speed() -> f64 {
    1.2
}

fn default_tolerance() -> f64 {
    0.1
}

impl Default for TimingSettings {
    fn default() -> Self {
        Self {
            mode: TimingMode::default(),
            min_speed: default_min_speed(),
            max_speed: default_max_speed(),
            tolerance_secs: default_tolerance(),
        }
    }
}

/// Timeline mixing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MixerSettings {
    /// Placement policy.
    #[serde(default)]
    pub policy: MixPolicy,

    /// Minimum gap between clips in sequential mode (milliseconds).
    #[serde(default = "default_buffer_ms")]
    pub buffer_ms: u64,

    /// Lay the non-speech parts of the original under the dub.
    #[serde(default)]
    pub preserve_background: bool,

    /// Gain applied to the background bed (dB).
    #[serde(default = "default_background_gain")]
    pub background_gain_db: f64,
}

fn default_buffer_ms() -> u64 {
    50
}

fn default_background_gain() -> f64 {
    -20.0
}

impl Default for MixerSettings {
    fn default() -> Self {
        Self {
            policy: MixPolicy::default(),
            buffer_ms: default_buffer_ms(),
            preserve_background: false,
            background_gain_db: default_background_gain(),
        }
    }
}

/// Output file settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputSettings {
    /// Write transcription/translation/synthesis JSON into the work dir.
    #[serde(default)]
    pub save_intermediates: bool,

    /// Remove the job work directory after a successful run.
    #[serde(default = "default_true")]
    pub cleanup_work_dir: bool,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            save_intermediates: false,
            cleanup_work_dir: true,
        }
    }
}

/// External engine commands.
///
/// Each command is an argv list; placeholders such as `{input}`,
/// `{output}`, `{text}`, `{src_lang}`, `{tgt_lang}`, `{lang}`,
/// `{reference}` and `{voice}` are substituted per call. An empty list
/// means the engine is not configured.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineSettings {
    /// Speaker diarization; prints a JSON array of turns.
    #[serde(default)]
    pub diarization: Vec<String>,

    /// Speech recognition; prints `{language, segments}` JSON.
    #[serde(default)]
    pub transcription: Vec<String>,

    /// Translation; prints translated text.
    #[serde(default)]
    pub translation: Vec<String>,

    /// Voice-clone synthesis; writes `{output}`.
    #[serde(default)]
    pub voice_clone: Vec<String>,

    /// Preset-voice synthesis; writes `{output}`.
    #[serde(default)]
    pub neural_voice: Vec<String>,

    /// Basic synthesis; writes `{output}`.
    #[serde(default)]
    pub basic_voice: Vec<String>,
}

/// Configuration sections for atomic updates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSection {
    Paths,
    Logging,
    Audio,
    Alignment,
    References,
    Synthesis,
    Timing,
    Mixer,
    Output,
    Engines,
}

impl ConfigSection {
    /// All sections in file order.
    pub const ALL: [ConfigSection; 10] = [
        ConfigSection::Paths,
        ConfigSection::Logging,
        ConfigSection::Audio,
        ConfigSection::Alignment,
        ConfigSection::References,
        ConfigSection::Synthesis,
        ConfigSection::Timing,
        ConfigSection::Mixer,
        ConfigSection::Output,
        ConfigSection::Engines,
    ];

    /// Get the TOML table name for this section.
    pub fn table_name(&self) -> &'static str {
        match self {
            ConfigSection::Paths => "paths",
            ConfigSection::Logging => "logging",
            ConfigSection::Audio => "audio",
            ConfigSection::Alignment => "alignment",
            ConfigSection::References => "references",
            ConfigSection::Synthesis => "synthesis",
            ConfigSection::Timing => "timing",
            ConfigSection::Mixer => "mixer",
            ConfigSection::Output => "output",
            ConfigSection::Engines => "engines",
        }
    }

    /// Comment written above the section in generated files.
    pub fn comment(&self) -> &'static str {
        match self {
            ConfigSection::Paths => "Output and working directories",
            ConfigSection::Logging => "Logging configuration",
            ConfigSection::Audio => "Decode sample rate",
            ConfigSection::Alignment => "Speaker and transcript alignment",
            ConfigSection::References => "Voice reference selection",
            ConfigSection::Synthesis => "Synthesis fallback chain",
            ConfigSection::Timing => "Duration matching (mode: fit | defer)",
            ConfigSection::Mixer => "Timeline mixing (policy: fixed_slot | sequential)",
            ConfigSection::Output => "Output files",
            ConfigSection::Engines => "External engine commands (argv lists, empty = not configured)",
        }
    }
}
