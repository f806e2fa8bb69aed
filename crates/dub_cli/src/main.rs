//! dub - command-line front end for Dub Sync.

mod cli;

use std::path::Path;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Parser;

use dub_core::config::{ConfigManager, ConfigSection, Settings};
use dub_core::engines::CommandEngineFactory;
use dub_core::jobs::{DubbingService, JobRecord, JobStatus};
use dub_core::logging::{init_tracing, LogLevel};
use dub_core::models::language::normalize_code;
use dub_core::models::{JobRequest, MixPolicy, SUPPORTED_LANGUAGES};
use dub_core::synthesis::VOICE_PRESETS;

use cli::{Cli, Commands, ConfigAction, PolicyArg};

const POLL_INTERVAL: Duration = Duration::from_millis(250);

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(if cli.verbose {
        LogLevel::Debug
    } else {
        LogLevel::Warn
    });

    match cli.command {
        Commands::Run {
            input,
            source,
            target,
            output,
            sequential,
            keep_intermediates,
            json,
        } => {
            let mut settings = load_settings(&cli.config)?;
            if sequential {
                settings.mixer.policy = MixPolicy::Sequential;
            }
            if keep_intermediates {
                settings.output.save_intermediates = true;
            }

            let mut request = JobRequest::new(input, target).with_source(source);
            if let Some(output) = output {
                request = request.with_output(output);
            }

            let record = run_job(settings, request, cli.verbose)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&record)?);
            }
            if record.status != JobStatus::Completed {
                bail!("{}", record.message);
            }
        }
        Commands::Languages => {
            for (code, name) in SUPPORTED_LANGUAGES {
                println!("{:<6} {}", code, name);
            }
        }
        Commands::Voices { lang } => {
            let wanted = lang.as_deref().map(normalize_code);
            let mut shown = 0;
            for (code, male, female) in VOICE_PRESETS {
                if wanted.as_deref().is_some_and(|w| w != *code) {
                    continue;
                }
                println!("{:<6} male: {:<24} female: {}", code, male, female);
                shown += 1;
            }
            if shown == 0 {
                bail!("No preset voices for '{}'", lang.unwrap_or_default());
            }
        }
        Commands::Config { action } => match action {
            ConfigAction::Init { force } => {
                if cli.config.exists() && !force {
                    bail!(
                        "{} already exists (use --force to overwrite)",
                        cli.config.display()
                    );
                }
                let config = ConfigManager::new(&cli.config);
                config.save()?;
                println!("Wrote {}", cli.config.display());
            }
            ConfigAction::Show => {
                let mut config = ConfigManager::new(&cli.config);
                config.load_or_create()?;
                let text = std::fs::read_to_string(config.path())
                    .with_context(|| format!("reading {}", config.path().display()))?;
                print!("{}", text);
            }
            ConfigAction::Policy { policy } => {
                let mut config = ConfigManager::new(&cli.config);
                config.load_or_create()?;
                config.settings_mut().mixer.policy = match policy {
                    PolicyArg::FixedSlot => MixPolicy::FixedSlot,
                    PolicyArg::Sequential => MixPolicy::Sequential,
                };
                config.update_section(ConfigSection::Mixer)?;
                println!("Mix policy set to {:?}", policy);
            }
        },
    }

    Ok(())
}

fn load_settings(path: &Path) -> Result<Settings> {
    let mut config = ConfigManager::new(path);
    config
        .load_or_create()
        .with_context(|| format!("loading config {}", path.display()))?;
    config.ensure_dirs_exist()?;
    Ok(config.settings().clone())
}

/// Submit, then poll and print stage changes until the job finishes.
fn run_job(settings: Settings, request: JobRequest, verbose: bool) -> Result<JobRecord> {
    let mut service = DubbingService::new(settings, Arc::new(CommandEngineFactory));
    if verbose {
        service = service.with_log_sink(Arc::new(|_, line| eprintln!("{}", line)));
    }

    let job_id = service.submit(request)?;
    eprintln!("Job {} started", job_id);

    let mut last_stage = None;
    loop {
        let record = service.status(&job_id)?;
        if last_stage != Some(record.stage) {
            eprintln!("[{:>3}%] {}", record.progress, record.stage);
            last_stage = Some(record.stage);
        }
        if record.is_finished() {
            break;
        }
        thread::sleep(POLL_INTERVAL);
    }

    let record = service.wait(&job_id)?;
    match record.status {
        JobStatus::Completed => {
            if let Some(metadata) = &record.metadata {
                for voice in metadata.voices.values() {
                    eprintln!(
                        "  {}: {} voice, preset {}",
                        voice.speaker_id,
                        voice.gender,
                        voice.preset_voice.as_deref().unwrap_or("none")
                    );
                }
                let tiers: Vec<String> = metadata
                    .tier_counts
                    .iter()
                    .map(|(tier, count)| format!("{}={}", tier.letter(), count))
                    .collect();
                eprintln!(
                    "  tiers: {}, {} failed segment(s)",
                    tiers.join(" "),
                    metadata.failed_segments
                );
            }
            if let Some(path) = &record.output_path {
                println!("{}", path.display());
            }
        }
        _ => eprintln!("Job {} failed: {}", job_id, record.message),
    }

    Ok(record)
}
