//! Per-job logger.
//!
//! One logger per dubbing job. Every line goes to the job's log file,
//! to an optional live callback (the CLI uses it for `-v`), and to
//! `tracing` under the `dub_job` target. Per-segment chatter is kept out
//! of the visible log in compact mode but still lands in the tail buffer,
//! which is replayed when the job fails.

use std::collections::VecDeque;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::Local;
use parking_lot::Mutex;
use serde::Serialize;

use super::types::{LogCallback, LogConfig, LogLevel, MessagePrefix};

pub struct JobLogger {
    job_id: String,
    log_path: PathBuf,
    file: Mutex<Option<BufWriter<File>>>,
    callback: Mutex<Option<LogCallback>>,
    config: LogConfig,
    /// Most recent lines, visible or not.
    tail: Mutex<VecDeque<String>>,
    /// Last percentage written by [`progress`](Self::progress).
    last_progress: Mutex<Option<u32>>,
}

impl JobLogger {
    /// Open `<log_dir>/<job_id>.log`, creating the directory if needed.
    pub fn new(
        job_id: impl Into<String>,
        log_dir: impl AsRef<Path>,
        config: LogConfig,
        callback: Option<LogCallback>,
    ) -> std::io::Result<Self> {
        let job_id = job_id.into();
        let log_dir = log_dir.as_ref();
        fs::create_dir_all(log_dir)?;

        let log_path = log_dir.join(format!("{}.log", file_safe(&job_id)));
        let file = File::create(&log_path)?;

        Ok(Self {
            job_id,
            log_path,
            file: Mutex::new(Some(BufWriter::new(file))),
            callback: Mutex::new(callback),
            tail: Mutex::new(VecDeque::with_capacity(config.error_tail)),
            config,
            last_progress: Mutex::new(None),
        })
    }

    pub fn log_path(&self) -> &Path {
        &self.log_path
    }

    /// Write `message` if `level` passes the configured threshold.
    ///
    /// The line enters the tail buffer either way.
    pub fn log(&self, level: LogLevel, message: &str) {
        self.remember(message);
        if level < self.config.level {
            return;
        }
        self.mirror(level, message);
        self.emit(message);
    }

    pub fn info(&self, message: &str) {
        self.log(LogLevel::Info, message);
    }

    pub fn debug(&self, message: &str) {
        self.log(LogLevel::Debug, message);
    }

    pub fn warn(&self, message: &str) {
        self.log(LogLevel::Warn, &MessagePrefix::Warning.format(message));
    }

    pub fn error(&self, message: &str) {
        self.log(LogLevel::Error, &MessagePrefix::Error.format(message));
    }

    /// `=== Step ===` marker at the start of each pipeline step.
    pub fn phase(&self, step: &str) {
        self.log(LogLevel::Info, &MessagePrefix::Phase.format(step));
    }

    /// `--- Title ---` marker inside a step.
    pub fn section(&self, title: &str) {
        self.log(LogLevel::Info, &MessagePrefix::Section.format(title));
    }

    pub fn success(&self, message: &str) {
        self.log(LogLevel::Info, &MessagePrefix::Success.format(message));
    }

    /// One line about one segment.
    ///
    /// Compact mode keeps these out of the file and callback; they only
    /// reach the tail buffer.
    pub fn segment(&self, index: usize, message: &str) {
        let line = MessagePrefix::Segment(index).format(message);
        if self.config.compact {
            self.remember(&line);
            self.mirror(LogLevel::Debug, &line);
            return;
        }
        self.log(LogLevel::Info, &line);
    }

    /// Percentage through a per-segment loop.
    ///
    /// In compact mode only every `progress_step` percent is written.
    /// Returns whether the line was written.
    pub fn progress(&self, percent: u32) -> bool {
        let percent = percent.min(100);
        if self.config.compact {
            let step = self.config.progress_step.max(1);
            let mut last = self.last_progress.lock();
            if let Some(previous) = *last {
                if percent / step <= previous / step && percent < 100 {
                    return false;
                }
            }
            *last = Some(percent);
        }
        self.log(LogLevel::Info, &format!("Progress: {}%", percent));
        true
    }

    /// Pretty JSON dump under a section header, at debug level.
    pub fn json<T: Serialize + ?Sized>(&self, title: &str, value: &T) {
        if LogLevel::Debug < self.config.level {
            return;
        }
        self.section(title);
        match serde_json::to_string_pretty(value) {
            Ok(json) => json.lines().for_each(|line| self.debug(line)),
            Err(e) => self.debug(&format!("<unserializable: {}>", e)),
        }
    }

    /// Replay the tail buffer, typically after a failure.
    pub fn show_tail(&self, header: &str) {
        let lines = self.tail();
        if lines.is_empty() {
            return;
        }
        self.emit(&format!("[{}/tail]", header));
        for line in &lines {
            self.emit(line);
        }
    }

    pub fn tail(&self) -> Vec<String> {
        self.tail.lock().iter().cloned().collect()
    }

    pub fn flush(&self) {
        if let Some(writer) = self.file.lock().as_mut() {
            let _ = writer.flush();
        }
    }

    /// Flush and release the log file.
    pub fn close(&self) {
        self.flush();
        *self.file.lock() = None;
    }

    fn remember(&self, line: &str) {
        if self.config.error_tail == 0 {
            return;
        }
        let mut tail = self.tail.lock();
        while tail.len() >= self.config.error_tail {
            tail.pop_front();
        }
        tail.push_back(line.to_string());
    }

    fn mirror(&self, level: LogLevel, message: &str) {
        let job = self.job_id.as_str();
        match level {
            LogLevel::Trace => tracing::trace!(target: "dub_job", job, "{}", message),
            LogLevel::Debug => tracing::debug!(target: "dub_job", job, "{}", message),
            LogLevel::Info => tracing::info!(target: "dub_job", job, "{}", message),
            LogLevel::Warn => tracing::warn!(target: "dub_job", job, "{}", message),
            LogLevel::Error => tracing::error!(target: "dub_job", job, "{}", message),
        }
    }

    fn emit(&self, message: &str) {
        let line = if self.config.show_timestamps {
            format!("[{}] {}", Local::now().format("%H:%M:%S"), message)
        } else {
            message.to_string()
        };

        if let Some(writer) = self.file.lock().as_mut() {
            let _ = writeln!(writer, "{}", line);
        }
        if let Some(callback) = self.callback.lock().as_ref() {
            callback(&line);
        }
    }
}

impl Drop for JobLogger {
    fn drop(&mut self) {
        self.close();
    }
}

fn file_safe(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            _ => c,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tempfile::tempdir;

    fn quiet() -> LogConfig {
        LogConfig {
            show_timestamps: false,
            ..LogConfig::default()
        }
    }

    #[test]
    fn writes_markers_to_file() {
        let dir = tempdir().unwrap();
        let logger = JobLogger::new("dub_abc", dir.path(), quiet(), None).unwrap();

        logger.phase("Synthesize");
        logger.section("Voices");
        logger.info("12 of 14 segments synthesized");
        logger.flush();

        assert!(logger.log_path().ends_with("dub_abc.log"));
        let content = fs::read_to_string(logger.log_path()).unwrap();
        assert!(content.contains("=== Synthesize ==="));
        assert!(content.contains("--- Voices ---"));
        assert!(content.contains("12 of 14 segments synthesized"));
    }

    #[test]
    fn callback_respects_level() {
        let dir = tempdir().unwrap();
        let count = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&count);
        let callback: LogCallback = Box::new(move |_| {
            seen.fetch_add(1, Ordering::SeqCst);
        });

        let logger = JobLogger::new("dub_abc", dir.path(), quiet(), Some(callback)).unwrap();
        logger.info("Message 1");
        logger.warn("Message 2");
        logger.debug("Filtered at info level");

        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn compact_progress_is_stepped() {
        let dir = tempdir().unwrap();
        let config = LogConfig {
            progress_step: 20,
            ..quiet()
        };
        let logger = JobLogger::new("dub_abc", dir.path(), config, None).unwrap();

        assert!(logger.progress(0));
        assert!(!logger.progress(15));
        assert!(logger.progress(20));
        assert!(!logger.progress(25));
        assert!(logger.progress(40));
        assert!(logger.progress(100));
    }

    #[test]
    fn compact_segment_lines_only_reach_the_tail() {
        let dir = tempdir().unwrap();
        let config = LogConfig {
            error_tail: 3,
            ..quiet()
        };
        let logger = JobLogger::new("dub_abc", dir.path(), config, None).unwrap();

        for i in 0..5 {
            logger.segment(i, "tier B");
        }
        logger.flush();

        assert_eq!(logger.tail(), vec!["[#0002] tier B", "[#0003] tier B", "[#0004] tier B"]);
        let content = fs::read_to_string(logger.log_path()).unwrap();
        assert!(!content.contains("tier B"));

        logger.show_tail("Synthesize");
        logger.flush();
        let content = fs::read_to_string(logger.log_path()).unwrap();
        assert!(content.contains("[Synthesize/tail]"));
        assert!(content.contains("[#0004] tier B"));
    }

    #[test]
    fn file_names_are_made_safe() {
        assert_eq!(file_safe("dub_1"), "dub_1");
        assert_eq!(file_safe("a/b:c"), "a_b_c");
    }
}
