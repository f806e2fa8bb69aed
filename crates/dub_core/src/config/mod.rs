//! `dub.toml`: one table per pipeline stage, defaults for anything absent.
//!
//! Step configs are derived from these settings with `From` impls next to
//! each stage, so the stages never read the file themselves.
//!
//! # Example
//!
//! ```no_run
//! use dub_core::config::{ConfigManager, ConfigSection};
//! use dub_core::models::MixPolicy;
//!
//! let mut config = ConfigManager::new(".config/dub.toml");
//! config.load_or_create().unwrap();
//!
//! println!("Output folder: {}", config.settings().paths.output_folder);
//!
//! config.settings_mut().mixer.policy = MixPolicy::Sequential;
//! config.update_section(ConfigSection::Mixer).unwrap();
//! ```

mod manager;
mod settings;

pub use manager::{ConfigError, ConfigManager, ConfigResult};
pub use settings::{
    AlignmentSettings, AudioSettings, ConfigSection, EngineSettings, LoggingSettings,
    MixerSettings, OutputSettings, PathSettings, ReferenceSettings, Settings, SynthesisSettings,
    TimingSettings,
};
