//! Leveled log sink.
//!
//! # Responsibilities
//! - Filter by level (`Debug < Info < Warn < Error`)
//! - Format `[YYYY-MM-DD HH:MM:SS.mmm] [LEVEL] [file:line] message`
//! - Write to stdout and/or a date-rotated file, flushing every line
//!
//! # Design Decisions
//! - One mutex covers format, rotation, write and flush, so concurrent
//!   callers never interleave partial lines
//! - Level lives in an atomic so filtered-out calls never take the lock
//! - The sink is an ordinary value shared through `Arc`; whoever builds it
//!   owns its `initialize`/`shutdown` ordering
//! - A failed rotation drops the file and keeps logging to the console

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Local};

use crate::config::schema::{LogConfig, LogLevel};
use crate::observability::rotation::{LogError, RotatingFile};

/// Source position attached to a log line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Location {
    pub file: &'static str,
    pub line: u32,
}

impl Location {
    pub const fn new(file: &'static str, line: u32) -> Self {
        Self { file, line }
    }
}

#[derive(Debug, Default)]
struct SinkState {
    initialized: bool,
    console_output: bool,
    file_output: bool,
    base_path: Option<PathBuf>,
    file: Option<RotatingFile>,
}

/// Thread-safe console and file logger.
#[derive(Debug)]
pub struct LogSink {
    level: AtomicU8,
    state: Mutex<SinkState>,
}

impl Default for LogSink {
    fn default() -> Self {
        Self::new()
    }
}

impl LogSink {
    /// An uninitialized sink; it drops every line until `initialize`.
    pub fn new() -> Self {
        Self {
            level: AtomicU8::new(LogLevel::Info as u8),
            state: Mutex::new(SinkState::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SinkState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Apply `config`, reopening the log file if file output is enabled.
    ///
    /// Re-initializing an active sink closes its current file first. On
    /// error the sink is left uninitialized.
    pub fn initialize(&self, config: &LogConfig) -> Result<(), LogError> {
        self.initialize_at(config, Local::now())
    }

    pub(crate) fn initialize_at(
        &self,
        config: &LogConfig,
        now: DateTime<Local>,
    ) -> Result<(), LogError> {
        let mut state = self.lock();
        *state = SinkState::default();

        self.level.store(config.level as u8, Ordering::Relaxed);
        state.console_output = config.console_output;
        state.file_output = config.file_output;
        state.base_path = (!config.file.is_empty()).then(|| PathBuf::from(&config.file));

        if state.file_output {
            if let Some(base) = state.base_path.clone() {
                state.file = Some(RotatingFile::open(&base, &date_of(&now))?);
            }
        }

        state.initialized = true;
        Ok(())
    }

    /// Close the log file and stop accepting lines.
    pub fn shutdown(&self) {
        let mut state = self.lock();
        state.file = None;
        state.initialized = false;
    }

    pub fn is_initialized(&self) -> bool {
        self.lock().initialized
    }

    pub fn set_level(&self, level: LogLevel) {
        self.level.store(level as u8, Ordering::Relaxed);
    }

    pub fn level(&self) -> LogLevel {
        LogLevel::from_u8(self.level.load(Ordering::Relaxed))
    }

    pub fn should_log(&self, level: LogLevel) -> bool {
        level >= self.level()
    }

    /// Path of the dated file currently being written, if any.
    pub fn current_file(&self) -> Option<PathBuf> {
        self.lock().file.as_ref().map(|f| f.path().to_path_buf())
    }

    /// Base path the dated file names are derived from.
    pub fn base_path(&self) -> Option<PathBuf> {
        self.lock().base_path.clone()
    }

    pub fn log(&self, level: LogLevel, message: &str, location: Option<Location>) {
        if !self.should_log(level) {
            return;
        }
        self.write_at(Local::now, level, message, location);
    }

    pub fn debug(&self, message: &str) {
        self.log(LogLevel::Debug, message, None);
    }

    pub fn info(&self, message: &str) {
        self.log(LogLevel::Info, message, None);
    }

    pub fn warn(&self, message: &str) {
        self.log(LogLevel::Warn, message, None);
    }

    pub fn error(&self, message: &str) {
        self.log(LogLevel::Error, message, None);
    }

    /// Write one line, reading `clock` only once the lock is held so
    /// timestamps and rotation dates follow lock order.
    pub(crate) fn write_at(
        &self,
        clock: impl FnOnce() -> DateTime<Local>,
        level: LogLevel,
        message: &str,
        location: Option<Location>,
    ) {
        let mut state = self.lock();
        if !state.initialized {
            return;
        }

        let now = clock();
        let line = format_line(&now, level, message, location);

        if state.console_output {
            let mut out = io::stdout().lock();
            let _ = writeln!(out, "{}", line);
        }

        if state.file_output {
            let date = date_of(&now);
            let failed = match state.file.as_mut() {
                Some(file) => file.write_line(&line, &date).err(),
                None => None,
            };
            if let Some(e) = failed {
                // Nowhere else to report this.
                eprintln!("{}; file logging disabled", e);
                state.file = None;
                state.file_output = false;
            }
        }
    }
}

fn date_of(now: &DateTime<Local>) -> String {
    now.format("%Y-%m-%d").to_string()
}

/// Render one log line.
pub fn format_line(
    now: &DateTime<Local>,
    level: LogLevel,
    message: &str,
    location: Option<Location>,
) -> String {
    let timestamp = now.format("%Y-%m-%d %H:%M:%S%.3f");
    match location.filter(|l| !l.file.is_empty() && l.line > 0) {
        Some(loc) => {
            let file = Path::new(loc.file)
                .file_name()
                .map(|f| f.to_string_lossy())
                .unwrap_or_else(|| loc.file.into());
            format!("[{}] [{}] [{}:{}] {}", timestamp, level.label(), file, loc.line, message)
        }
        None => format!("[{}] [{}] {}", timestamp, level.label(), message),
    }
}

/// Log through a [`LogSink`] at an explicit level, tagging the call site.
#[macro_export]
macro_rules! log_at {
    ($sink:expr, $level:expr, $($arg:tt)+) => {{
        let sink = &$sink;
        let level = $level;
        if sink.should_log(level) {
            sink.log(
                level,
                &format!($($arg)+),
                Some($crate::observability::logging::Location::new(file!(), line!())),
            );
        }
    }};
}

#[macro_export]
macro_rules! log_debug {
    ($sink:expr, $($arg:tt)+) => {
        $crate::log_at!($sink, $crate::config::LogLevel::Debug, $($arg)+)
    };
}

#[macro_export]
macro_rules! log_info {
    ($sink:expr, $($arg:tt)+) => {
        $crate::log_at!($sink, $crate::config::LogLevel::Info, $($arg)+)
    };
}

#[macro_export]
macro_rules! log_warn {
    ($sink:expr, $($arg:tt)+) => {
        $crate::log_at!($sink, $crate::config::LogLevel::Warn, $($arg)+)
    };
}

#[macro_export]
macro_rules! log_error {
    ($sink:expr, $($arg:tt)+) => {
        $crate::log_at!($sink, $crate::config::LogLevel::Error, $($arg)+)
    };
}
