//! Engines backed by external programs.
//!
//! Each engine is an argv template from the `[engines]` config section.
//! Placeholders are substituted per call, the program runs to completion,
//! and its stdout (JSON or plain text) or output file is the result.
//!
//! | Engine        | Placeholders                                   | Result                 |
//! |---------------|------------------------------------------------|------------------------|
//! | diarization   | `{input}`                                      | JSON `[SpeakerTurn]`   |
//! | transcription | `{input}`, `{lang}`                            | JSON `Transcript`      |
//! | translation   | `{text}`, `{src_lang}`, `{tgt_lang}`           | translated text        |
//! | synthesis     | `{text}`, `{lang}`, `{reference}`, `{voice}`, `{output}` | WAV at `{output}` |
//!
//! A translation command exits with [`UNSUPPORTED_PAIR_EXIT_CODE`] to
//! signal an unsupported language pair.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use serde::de::DeserializeOwned;

use super::types::{
    EngineError, EngineResult, SpeakerTurn, SynthesisRequest, Transcript,
};
use super::{Diarizer, SpeechSynthesizer, Transcriber, Translator};

/// Exit code a translation command uses for "language pair not supported".
pub const UNSUPPORTED_PAIR_EXIT_CODE: i32 = 3;

/// Captured output of a finished command.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

/// An argv template with `{name}` placeholders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandTemplate {
    argv: Vec<String>,
}

impl CommandTemplate {
    /// Create from a configured argv list. Returns `None` when empty.
    pub fn new(argv: &[String]) -> Option<Self> {
        if argv.first().map_or(true, |program| program.trim().is_empty()) {
            return None;
        }
        Some(Self {
            argv: argv.to_vec(),
        })
    }

    /// Program name, used as the tool name in errors.
    pub fn program(&self) -> &str {
        &self.argv[0]
    }

    /// Substitute placeholders in every argument.
    ///
    /// Each argument is scanned once; substituted values are never
    /// scanned again, so text containing `{output}` stays literal.
    pub fn render(&self, vars: &[(&str, &str)]) -> Vec<String> {
        self.argv.iter().map(|arg| render_arg(arg, vars)).collect()
    }

    /// Render and run; non-zero exit is returned as output, not an error.
    pub fn run(&self, vars: &[(&str, &str)]) -> EngineResult<CommandOutput> {
        run_command(&self.render(vars))
    }

    /// Render and run; non-zero exit becomes `CommandFailed`.
    pub fn run_checked(&self, vars: &[(&str, &str)]) -> EngineResult<CommandOutput> {
        let output = self.run(vars)?;
        if output.exit_code != 0 {
            return Err(EngineError::command_failed(
                self.program(),
                output.exit_code,
                output.stderr.trim(),
            ));
        }
        Ok(output)
    }
}

fn render_arg(arg: &str, vars: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(arg.len());
    let mut rest = arg;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let value = after.find('}').and_then(|close| {
            let key = &after[..close];
            vars.iter()
                .find(|(name, _)| *name == key)
                .map(|(_, value)| (*value, close))
        });
        match value {
            Some((value, close)) => {
                out.push_str(value);
                rest = &after[close + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

/// Run a command and capture its output.
pub fn run_command(argv: &[String]) -> EngineResult<CommandOutput> {
    let (program, args) = argv
        .split_first()
        .ok_or_else(|| EngineError::other("Empty command"))?;

    tracing::debug!("Running: {}", argv.join(" "));

    let output = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .map_err(|e| EngineError::io_error(format!("spawning {}", program), e))?;

    Ok(CommandOutput {
        stdout: String::from_utf8_lossy(&output.stdout).to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        exit_code: output.status.code().unwrap_or(-1),
    })
}

fn parse_json<T: DeserializeOwned>(what: &str, stdout: &str) -> EngineResult<T> {
    serde_json::from_str(stdout.trim()).map_err(|e| EngineError::parse_error(what, e.to_string()))
}

fn path_str(path: &Path) -> String {
    path.to_string_lossy().to_string()
}

/// Diarization via an external program printing JSON turns.
pub struct CommandDiarizer {
    template: CommandTemplate,
}

impl CommandDiarizer {
    pub fn new(template: CommandTemplate) -> Self {
        Self { template }
    }
}

impl Diarizer for CommandDiarizer {
    fn name(&self) -> &str {
        self.template.program()
    }

    fn diarize(&mut self, audio: &Path) -> EngineResult<Vec<SpeakerTurn>> {
        let input = path_str(audio);
        let output = self.template.run_checked(&[("input", &input)])?;
        parse_json("diarization output", &output.stdout)
    }
}

/// Speech recognition via an external program printing transcript JSON.
pub struct CommandTranscriber {
    template: CommandTemplate,
}

impl CommandTranscriber {
    pub fn new(template: CommandTemplate) -> Self {
        Self { template }
    }
}

impl Transcriber for CommandTranscriber {
    fn name(&self) -> &str {
        self.template.program()
    }

    fn transcribe(&mut self, audio: &Path, language_hint: Option<&str>) -> EngineResult<Transcript> {
        let input = path_str(audio);
        let lang = language_hint.unwrap_or(crate::models::AUTO_DETECT);
        let output = self
            .template
            .run_checked(&[("input", &input), ("lang", lang)])?;
        parse_json("transcription output", &output.stdout)
    }
}

/// Translation via an external program printing the translated text.
pub struct CommandTranslator {
    template: CommandTemplate,
}

impl CommandTranslator {
    pub fn new(template: CommandTemplate) -> Self {
        Self { template }
    }
}

impl Translator for CommandTranslator {
    fn name(&self) -> &str {
        self.template.program()
    }

    fn translate(&mut self, text: &str, source: &str, target: &str) -> EngineResult<String> {
        let output = self.template.run(&[
            ("text", text),
            ("src_lang", source),
            ("tgt_lang", target),
        ])?;

        match output.exit_code {
            0 => Ok(output.stdout.trim().to_string()),
            UNSUPPORTED_PAIR_EXIT_CODE => Err(EngineError::unsupported_pair(source, target)),
            code => Err(EngineError::command_failed(
                self.template.program(),
                code,
                output.stderr.trim(),
            )),
        }
    }
}

/// Synthesis via an external program that writes `{output}`.
pub struct CommandSynthesizer {
    template: CommandTemplate,
}

impl CommandSynthesizer {
    pub fn new(template: CommandTemplate) -> Self {
        Self { template }
    }
}

impl SpeechSynthesizer for CommandSynthesizer {
    fn name(&self) -> &str {
        self.template.program()
    }

    fn synthesize(&mut self, request: &SynthesisRequest<'_>) -> EngineResult<PathBuf> {
        if let Some(parent) = request.output_path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| EngineError::io_error("creating synthesis output dir", e))?;
        }

        let output_path = path_str(request.output_path);
        let reference = request.reference.map(path_str).unwrap_or_default();
        let voice = request.voice.unwrap_or_default();

        self.template.run_checked(&[
            ("text", request.text),
            ("lang", request.language),
            ("reference", &reference),
            ("voice", voice),
            ("output", &output_path),
        ])?;

        Ok(request.output_path.to_path_buf())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn template(argv: &[&str]) -> CommandTemplate {
        let argv: Vec<String> = argv.iter().map(|s| s.to_string()).collect();
        CommandTemplate::new(&argv).unwrap()
    }

    #[test]
    fn empty_template_is_not_configured() {
        assert!(CommandTemplate::new(&[]).is_none());
        assert!(CommandTemplate::new(&["".to_string()]).is_none());
    }

    #[test]
    fn render_substitutes_placeholders() {
        let t = template(&["tts", "--text={text}", "--out", "{output}", "{missing}"]);
        let argv = t.render(&[("text", "hola mundo"), ("output", "/tmp/a.wav")]);
        assert_eq!(
            argv,
            vec!["tts", "--text=hola mundo", "--out", "/tmp/a.wav", "{missing}"]
        );
    }

    #[test]
    fn substituted_text_is_not_expanded_again() {
        let t = template(&["tts", "--text={text}", "--lang={lang}", "{output}"]);
        let argv = t.render(&[
            ("text", "say {output} and {lang}"),
            ("lang", "es"),
            ("output", "/tmp/a.wav"),
        ]);
        assert_eq!(
            argv,
            vec!["tts", "--text=say {output} and {lang}", "--lang=es", "/tmp/a.wav"]
        );
        assert_eq!(render_arg("{{text}}", &[("text", "x")]), "{x}");
    }

    #[cfg(unix)]
    #[test]
    fn diarizer_parses_json_stdout() {
        let mut diarizer = CommandDiarizer::new(template(&[
            "sh",
            "-c",
            r#"echo '[{"speaker_id":"S1","start":0.0,"end":2.5}]'"#,
        ]));
        let turns = diarizer.diarize(Path::new("in.wav")).unwrap();
        assert_eq!(turns, vec![SpeakerTurn::new("S1", 0.0, 2.5)]);
    }

    #[cfg(unix)]
    #[test]
    fn translator_maps_exit_code_to_unsupported_pair() {
        let mut translator = CommandTranslator::new(template(&["sh", "-c", "exit 3"]));
        let err = translator.translate("hello", "en", "xx").unwrap_err();
        assert!(err.is_unsupported_pair());

        let mut failing = CommandTranslator::new(template(&["sh", "-c", "echo oops >&2; exit 1"]));
        let err = failing.translate("hello", "en", "es").unwrap_err();
        assert!(matches!(err, EngineError::CommandFailed { exit_code: 1, .. }));
    }

    #[cfg(unix)]
    #[test]
    fn translator_returns_trimmed_stdout() {
        let mut translator = CommandTranslator::new(template(&["sh", "-c", "echo \"$0 ($1)\"", "{text}", "{tgt_lang}"]));
        assert_eq!(translator.translate("hola", "es", "en").unwrap(), "hola (en)");
    }

    #[cfg(unix)]
    #[test]
    fn synthesizer_writes_output_path() {
        let dir = tempdir().unwrap();
        let out = dir.path().join("clips").join("seg.wav");
        let mut tts = CommandSynthesizer::new(template(&["sh", "-c", "printf RIFF > \"$0\"", "{output}"]));
        let request = SynthesisRequest {
            text: "hello",
            language: "en",
            reference: None,
            voice: None,
            output_path: &out,
        };
        let path = tts.synthesize(&request).unwrap();
        assert_eq!(path, out);
        assert!(out.exists());
    }

    #[test]
    fn missing_program_is_io_error() {
        let result = run_command(&["definitely-not-a-real-program-xyz".to_string()]);
        assert!(matches!(result, Err(EngineError::IoError { .. })));
    }
}
