//! Date-based log file rotation.
//!
//! The configured path `dir/stem.ext` is never written directly; lines go to
//! `dir/stem_YYYY-MM-DD.ext` for the calendar date of each line.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Error type for log file operations.
#[derive(Debug, thiserror::Error)]
pub enum LogError {
    #[error("Failed to create log directory {}: {source}", path.display())]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to open log file {}: {source}", path.display())]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to write log file {}: {source}", path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Dated file name for `base` on `date` (`YYYY-MM-DD`).
pub fn dated_path(base: &Path, date: &str) -> PathBuf {
    let stem = base
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match base.extension() {
        Some(ext) => format!("{}_{}.{}", stem, date, ext.to_string_lossy()),
        None => format!("{}_{}", stem, date),
    };

    match base.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.join(name),
        _ => PathBuf::from(name),
    }
}

/// Append-mode handle on the current dated log file.
#[derive(Debug)]
pub struct RotatingFile {
    base: PathBuf,
    date: String,
    path: PathBuf,
    file: File,
}

impl RotatingFile {
    /// Open (creating directories as needed) the file for `date`.
    pub fn open(base: &Path, date: &str) -> Result<Self, LogError> {
        let path = dated_path(base, date);

        if let Some(dir) = path.parent() {
            if !dir.as_os_str().is_empty() && !dir.exists() {
                fs::create_dir_all(dir).map_err(|source| LogError::CreateDir {
                    path: dir.to_path_buf(),
                    source,
                })?;
            }
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|source| LogError::Open {
                path: path.clone(),
                source,
            })?;

        Ok(Self {
            base: base.to_path_buf(),
            date: date.to_string(),
            path,
            file,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn date(&self) -> &str {
        &self.date
    }

    /// Write one line stamped with `date`, switching files first if `date`
    /// is later than the one this file was opened for. Rotation only moves
    /// forward; an earlier date is written to the current file. Flushed
    /// before returning.
    pub fn write_line(&mut self, line: &str, date: &str) -> Result<(), LogError> {
        if date > self.date.as_str() {
            *self = RotatingFile::open(&self.base, date)?;
        }

        writeln!(self.file, "{}", line)
            .and_then(|_| self.file.flush())
            .map_err(|source| LogError::Write {
                path: self.path.clone(),
                source,
            })
    }
}
