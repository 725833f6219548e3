//! Buffer of formatted lines waiting to be written to disk
//!
//! Log calls append to the buffer from any thread. A flush reads a snapshot,
//! writes it, and then removes exactly the bytes it wrote, so lines appended
//! while the write was in flight stay queued for the next flush.

use std::sync::{Mutex, MutexGuard, PoisonError};

/// Thread-safe accumulator of raw log lines
#[derive(Debug, Default)]
pub struct PendingBuffer {
    lines: Mutex<String>,
}

impl PendingBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    // A panic while appending cannot leave a half-written line behind, so a
    // poisoned lock still holds consistent data.
    fn lock(&self) -> MutexGuard<'_, String> {
        self.lines.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append a raw line
    pub fn push(&self, line: &str) {
        self.lock().push_str(line);
    }

    /// Copy of everything currently pending
    pub fn snapshot(&self) -> String {
        self.lock().clone()
    }

    /// Remove the first `len` bytes after they were written out
    pub fn consume(&self, len: usize) {
        let mut lines = self.lock();
        let len = len.min(lines.len());
        lines.drain(..len);
    }

    /// Number of pending bytes
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
