//! Command-line interface for dub.
//!
//! Argument parsing with clap derive macros.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// Dub spoken audio into another language
#[derive(Parser, Debug)]
#[command(name = "dub", version, about = "Dub spoken audio into another language")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file
    #[arg(long, global = true, value_name = "PATH", default_value = ".config/dub.toml")]
    pub config: PathBuf,

    /// Verbose output (debug logging and live job log)
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Dub one file and wait for the result
    Run {
        /// Input media file
        #[arg(long, short = 'i', value_name = "FILE")]
        input: PathBuf,

        /// Source language code, or `auto` to detect
        #[arg(long, short = 's', value_name = "LANG", default_value = "auto")]
        source: String,

        /// Target language code
        #[arg(long, short = 't', value_name = "LANG")]
        target: String,

        /// Output WAV (default: <output_folder>/dubbed_<job>_<target>.wav)
        #[arg(long, short = 'o', value_name = "FILE")]
        output: Option<PathBuf>,

        /// Place clips one after another instead of in their original slots
        #[arg(long)]
        sequential: bool,

        /// Keep transcription/translation/synthesis JSON in the work directory
        #[arg(long)]
        keep_intermediates: bool,

        /// Print the final job record as JSON
        #[arg(long)]
        json: bool,
    },

    /// List supported languages
    Languages,

    /// Show preset voices
    Voices {
        /// Only this language
        #[arg(long, value_name = "LANG")]
        lang: Option<String>,
    },

    /// Manage the configuration file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Write a config file with defaults
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Print the effective configuration
    Show,
    /// Set the default mix policy
    Policy {
        #[arg(value_enum)]
        policy: PolicyArg,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum PolicyArg {
    /// Each clip starts at its original timestamp
    FixedSlot,
    /// Clips are placed back to back
    Sequential,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_defaults_to_auto_source() {
        let cli = Cli::try_parse_from(["dub", "run", "-i", "talk.mp4", "-t", "es"]).unwrap();
        assert_eq!(cli.config, PathBuf::from(".config/dub.toml"));
        match cli.command {
            Commands::Run {
                input,
                source,
                target,
                output,
                sequential,
                ..
            } => {
                assert_eq!(input, PathBuf::from("talk.mp4"));
                assert_eq!(source, "auto");
                assert_eq!(target, "es");
                assert!(output.is_none());
                assert!(!sequential);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn run_requires_target() {
        assert!(Cli::try_parse_from(["dub", "run", "-i", "talk.mp4"]).is_err());
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli =
            Cli::try_parse_from(["dub", "voices", "--lang", "fr", "-v", "--config", "x.toml"])
                .unwrap();
        assert!(cli.verbose);
        assert_eq!(cli.config, PathBuf::from("x.toml"));
        assert!(matches!(cli.command, Commands::Voices { lang: Some(ref l) } if l == "fr"));
    }

    #[test]
    fn config_subcommands_parse() {
        let cli = Cli::try_parse_from(["dub", "config", "init", "--force"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Config {
                action: ConfigAction::Init { force: true }
            }
        ));

        let cli = Cli::try_parse_from(["dub", "config", "policy", "sequential"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Config {
                action: ConfigAction::Policy {
                    policy: PolicyArg::Sequential
                }
            }
        ));
        assert!(Cli::try_parse_from(["dub", "config", "policy", "random"]).is_err());
    }
}
