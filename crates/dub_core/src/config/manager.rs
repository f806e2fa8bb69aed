//! Reading and writing `dub.toml`.
//!
//! The whole file is regenerated on [`ConfigManager::save`]. Changing a
//! single table goes through [`ConfigManager::update_section`], which edits
//! the document with `toml_edit` so hand-written comments elsewhere stay.
//! Every write lands in a sibling temp file first and is renamed into place.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;
use toml_edit::{DocumentMut, Item};

use super::settings::{ConfigSection, Settings};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("config I/O failed: {0}")]
    Io(#[from] io::Error),

    #[error("config is not valid TOML for these settings: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("could not serialize settings: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("could not edit config document: {0}")]
    Edit(#[from] toml_edit::TomlError),

    #[error("no config at {0}")]
    NotFound(PathBuf),

    #[error("invalid setting: {0}")]
    Invalid(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Owns one config file and the settings read from it.
pub struct ConfigManager {
    path: PathBuf,
    settings: Settings,
}

impl ConfigManager {
    pub const DEFAULT_PATH: &'static str = ".config/dub.toml";

    /// Manager with default settings; nothing is read until a load call.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            settings: Settings::default(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// In-memory edits; persist with `save` or `update_section`.
    pub fn settings_mut(&mut self) -> &mut Settings {
        &mut self.settings
    }

    /// Read and validate an existing file.
    pub fn load(&mut self) -> ConfigResult<()> {
        if !self.path.exists() {
            return Err(ConfigError::NotFound(self.path.clone()));
        }
        let (settings, _) = read_settings(&fs::read_to_string(&self.path)?)?;
        self.settings = settings;
        Ok(())
    }

    /// Read the file, or write one with defaults when it is missing.
    ///
    /// A file missing any table, or carrying tables this version does not
    /// know, is rewritten with the effective settings.
    pub fn load_or_create(&mut self) -> ConfigResult<()> {
        if !self.path.exists() {
            self.settings = Settings::default();
            return self.save();
        }

        let (settings, stale) = read_settings(&fs::read_to_string(&self.path)?)?;
        self.settings = settings;
        if stale {
            tracing::debug!("Refreshing tables in {}", self.path.display());
            self.save()?;
        }
        Ok(())
    }

    /// Create the output, work and log folders.
    pub fn ensure_dirs_exist(&self) -> ConfigResult<()> {
        let paths = &self.settings.paths;
        for dir in [&paths.output_folder, &paths.temp_root, &paths.logs_folder] {
            fs::create_dir_all(dir)?;
        }
        Ok(())
    }

    /// Regenerate the whole file, one commented table per section.
    pub fn save(&self) -> ConfigResult<()> {
        let mut text = String::from("# Dub Sync configuration\n");
        for section in ConfigSection::ALL {
            text.push_str(&format!(
                "\n# {}\n[{}]\n",
                section.comment(),
                section.table_name()
            ));
            text.push_str(&self.table_body(section)?);
            if !text.ends_with('\n') {
                text.push('\n');
            }
        }
        self.replace_file(&text)?;
        Ok(())
    }

    /// Write only `section` back, keeping the rest of the file as it is.
    pub fn update_section(&mut self, section: ConfigSection) -> ConfigResult<()> {
        let mut doc = match fs::read_to_string(&self.path) {
            Ok(text) => text.parse::<DocumentMut>()?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => DocumentMut::new(),
            Err(e) => return Err(e.into()),
        };

        let table: DocumentMut = self.table_body(section)?.parse()?;
        doc[section.table_name()] = Item::Table(table.as_table().clone());
        self.replace_file(&doc.to_string())?;
        Ok(())
    }

    fn table_body(&self, section: ConfigSection) -> ConfigResult<String> {
        let s = &self.settings;
        let body = match section {
            ConfigSection::Paths => toml::to_string_pretty(&s.paths)?,
            ConfigSection::Logging => toml::to_string_pretty(&s.logging)?,
            ConfigSection::Audio => toml::to_string_pretty(&s.audio)?,
            ConfigSection::Alignment => toml::to_string_pretty(&s.alignment)?,
            ConfigSection::References => toml::to_string_pretty(&s.references)?,
            ConfigSection::Synthesis => toml::to_string_pretty(&s.synthesis)?,
            ConfigSection::Timing => toml::to_string_pretty(&s.timing)?,
            ConfigSection::Mixer => toml::to_string_pretty(&s.mixer)?,
            ConfigSection::Output => toml::to_string_pretty(&s.output)?,
            ConfigSection::Engines => toml::to_string_pretty(&s.engines)?,
        };
        Ok(body)
    }

    fn replace_file(&self, text: &str) -> io::Result<()> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir)?;
        }
        let staging = self.path.with_extension("toml.tmp");
        let mut file = fs::File::create(&staging)?;
        file.write_all(text.as_bytes())?;
        file.sync_all()?;
        drop(file);
        fs::rename(&staging, &self.path)
    }
}

/// Parse and validate; the flag reports tables that are missing or unknown.
fn read_settings(text: &str) -> ConfigResult<(Settings, bool)> {
    let settings: Settings = toml::from_str(text)?;
    validate(&settings)?;

    let doc: DocumentMut = text.parse()?;
    let known = |key: &str| ConfigSection::ALL.iter().any(|s| s.table_name() == key);
    let stale = doc.iter().any(|(key, _)| !known(key))
        || ConfigSection::ALL
            .iter()
            .any(|s| !doc.contains_key(s.table_name()));

    Ok((settings, stale))
}

/// Reject values the pipeline cannot run with.
fn validate(settings: &Settings) -> ConfigResult<()> {
    let timing = &settings.timing;
    if !(timing.min_speed > 0.0 && timing.min_speed <= 1.0 && timing.max_speed >= 1.0) {
        return Err(ConfigError::Invalid(format!(
            "timing speed range [{}, {}] must contain 1.0 and be positive",
            timing.min_speed, timing.max_speed
        )));
    }
    if settings.audio.sample_rate < 8000 {
        return Err(ConfigError::Invalid(format!(
            "audio.sample_rate {} is below 8000 Hz",
            settings.audio.sample_rate
        )));
    }
    if settings.alignment.merge_gap_secs < 0.0 {
        return Err(ConfigError::Invalid(
            "alignment.merge_gap_secs must not be negative".to_string(),
        ));
    }
    if settings.references.max_clips == 0 {
        return Err(ConfigError::Invalid(
            "references.max_clips must be at least 1".to_string(),
        ));
    }
    Ok(())
}
