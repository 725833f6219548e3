//! Error types for log persistence

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while persisting log lines
#[derive(Debug, Error)]
pub enum LogError {
    /// The log directory could not be created
    #[error("failed to create log directory {}", path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The day's log file could not be opened or appended to
    #[error("failed to append to log file {}", path.display())]
    Append {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A blocking flush task was cancelled or panicked
    #[error("flush task did not complete: {0}")]
    Interrupted(String),
}

impl LogError {
    /// Classify the underlying I/O failure
    pub fn kind(&self) -> DiskErrorKind {
        match self {
            LogError::CreateDir { source, .. } | LogError::Append { source, .. } => {
                DiskErrorKind::from(source)
            }
            LogError::Interrupted(_) => DiskErrorKind::Other,
        }
    }
}

/// Categories of disk errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiskErrorKind {
    /// Disk is full or quota exceeded
    DiskFull,
    /// Permission denied (read or write)
    PermissionDenied,
    /// File or directory not found
    NotFound,
    /// Other IO error
    Other,
}

impl DiskErrorKind {
    pub fn description(&self) -> &'static str {
        match self {
            DiskErrorKind::DiskFull => "disk full",
            DiskErrorKind::PermissionDenied => "permission denied",
            DiskErrorKind::NotFound => "file or directory not found",
            DiskErrorKind::Other => "i/o error",
        }
    }

    #[cfg(unix)]
    fn from_os_code(code: i32) -> Option<Self> {
        const EACCES: i32 = 13;
        const ENOSPC: i32 = 28;
        #[cfg(target_os = "macos")]
        const EDQUOT: i32 = 69;
        #[cfg(not(target_os = "macos"))]
        const EDQUOT: i32 = 122;

        match code {
            ENOSPC | EDQUOT => Some(DiskErrorKind::DiskFull),
            EACCES => Some(DiskErrorKind::PermissionDenied),
            _ => None,
        }
    }

    #[cfg(not(unix))]
    fn from_os_code(_code: i32) -> Option<Self> {
        None
    }
}

impl From<&std::io::Error> for DiskErrorKind {
    fn from(err: &std::io::Error) -> Self {
        use std::io::ErrorKind;

        match err.kind() {
            ErrorKind::NotFound => DiskErrorKind::NotFound,
            ErrorKind::PermissionDenied => DiskErrorKind::PermissionDenied,
            ErrorKind::WriteZero => DiskErrorKind::DiskFull,
            _ => err
                .raw_os_error()
                .and_then(DiskErrorKind::from_os_code)
                .unwrap_or(DiskErrorKind::Other),
        }
    }
}
