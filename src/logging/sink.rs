//! Daily log file storage
//!
//! Lines are appended to `<dir>/<YYYY-MM-DD>.log`, one file per local day.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::LogError;

/// Destination for flushed log lines
pub trait LogSink: Send + Sync {
    /// Make sure the destination can accept writes (e.g. create directories)
    fn prepare(&self) -> Result<(), LogError>;

    /// Append `bytes` to the bucket for `date` (`YYYY-MM-DD`)
    fn append(&self, date: &str, bytes: &[u8]) -> Result<(), LogError>;
}

/// Path of the log file for a given date
pub fn log_file_path(dir: &Path, date: &str) -> PathBuf {
    dir.join(format!("{}.log", date))
}

/// Sink writing one append-only file per day into a directory
#[derive(Debug, Clone)]
pub struct DailyFileSink {
    dir: PathBuf,
}

impl DailyFileSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl LogSink for DailyFileSink {
    fn prepare(&self) -> Result<(), LogError> {
        fs::create_dir_all(&self.dir).map_err(|source| LogError::CreateDir {
            path: self.dir.clone(),
            source,
        })
    }

    fn append(&self, date: &str, bytes: &[u8]) -> Result<(), LogError> {
        let path = log_file_path(&self.dir, date);
        let result = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .and_then(|mut file| {
                file.write_all(bytes)?;
                file.flush()
            });

        result.map_err(|source| LogError::Append { path, source })
    }
}
