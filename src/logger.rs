//! The logger facade
//!
//! A `Logger` is a cheap, cloneable handle. Every log call formats the line,
//! appends the plain form to the pending buffer and prints the colorized form
//! to the console (debug lines only when debug output is enabled). Writing to
//! disk happens separately, either through the background daemon or through
//! an explicit `save`.

use std::io::{self, Write};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, TryLockError, Weak};
use std::time::{Duration, Instant};

use chrono::{FixedOffset, Utc};
use tokio::task::JoinHandle;

use crate::config::LoggerOptions;
use crate::daemon::Daemon;
use crate::error::LogError;
use crate::fatal;
use crate::logging::console::{print_line, Output, Stdout};
use crate::logging::{
    DailyFileSink, Formatter, LogSink, Message, PendingBuffer, Severity, INTERNAL_TARGET,
};

/// How long a fatal report waits for each lock held elsewhere
const FATAL_SAVE_WAIT: Duration = Duration::from_secs(2);

/// State shared by all handles of one logger, the daemon and the fatal hook
pub(crate) struct Core {
    options: LoggerOptions,
    formatter: Formatter,
    pending: PendingBuffer,
    save_lock: Mutex<()>,
    sink: Box<dyn LogSink>,
    console: Mutex<Box<dyn Output>>,
}

impl Core {
    pub(crate) fn log(&self, severity: Severity, message: &Message) {
        let line = self
            .formatter
            .format(severity, message.as_str(), Utc::now());
        self.pending.push(&line.raw);

        if severity.is_suppressible() && !self.options.debug {
            return;
        }
        self.print(&line.display);
    }

    fn print(&self, display: &str) {
        let mut console = self.console.lock().unwrap_or_else(PoisonError::into_inner);
        let _ = print_line(&mut **console, display);
    }

    pub(crate) fn prepare(&self) -> Result<(), LogError> {
        self.sink.prepare()
    }

    pub(crate) fn save(&self) -> Result<(), LogError> {
        let _guard = self.save_lock.lock().unwrap_or_else(PoisonError::into_inner);
        self.write_pending()
    }

    // Callers must hold `save_lock`.
    fn write_pending(&self) -> Result<(), LogError> {
        let pending = self.pending.snapshot();
        if pending.is_empty() {
            return Ok(());
        }

        let date = self.formatter.date_stamp(Utc::now());
        self.sink.append(&date, pending.as_bytes())?;
        self.pending.consume(pending.len());

        tracing::trace!(
            target: INTERNAL_TARGET,
            bytes = pending.len(),
            %date,
            "flushed pending log lines"
        );
        Ok(())
    }

    /// Report a fatal error and make one best-effort attempt to persist it
    ///
    /// Runs inside the panic hook, possibly on a thread that already holds
    /// the console or save lock, so neither lock is waited on for longer
    /// than `FATAL_SAVE_WAIT`.
    pub(crate) fn fatal(&self, description: &str) {
        let line = self.formatter.format(
            Severity::Fatal,
            &format!("\n{}", description),
            Utc::now(),
        );

        match lock_until(&self.console, Instant::now() + FATAL_SAVE_WAIT) {
            Some(mut console) => {
                let _ = print_line(&mut **console, &line.display);
            }
            None => {
                let _ = writeln!(io::stderr(), "{}", line.display);
            }
        }
        self.pending.push(&line.raw);

        if let Some(_guard) = lock_until(&self.save_lock, Instant::now() + FATAL_SAVE_WAIT) {
            let _ = self.write_pending();
        }
    }

    pub(crate) fn options(&self) -> &LoggerOptions {
        &self.options
    }
}

/// Lock `mutex`, giving up at `deadline`. A poisoned lock is still taken.
fn lock_until<T: ?Sized>(mutex: &Mutex<T>, deadline: Instant) -> Option<MutexGuard<'_, T>> {
    loop {
        match mutex.try_lock() {
            Ok(guard) => return Some(guard),
            Err(TryLockError::Poisoned(poisoned)) => return Some(poisoned.into_inner()),
            Err(TryLockError::WouldBlock) if Instant::now() < deadline => {
                std::thread::sleep(Duration::from_millis(10));
            }
            Err(TryLockError::WouldBlock) => return None,
        }
    }
}

impl Drop for Core {
    fn drop(&mut self) {
        if !self.pending.is_empty() {
            let _ = self.save();
        }
    }
}

/// Handle to a logger
#[derive(Clone)]
pub struct Logger {
    core: Arc<Core>,
}

impl std::fmt::Debug for Logger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Logger")
            .field("options", &self.core.options)
            .field("pending_bytes", &self.core.pending.len())
            .finish()
    }
}

impl Logger {
    /// Create a logger writing to daily files under `options.path` and start
    /// its flush daemon
    ///
    /// Must be called from within a Tokio runtime.
    pub fn new(options: LoggerOptions) -> Self {
        Self::builder(options).start()
    }

    pub fn builder(options: LoggerOptions) -> LoggerBuilder {
        LoggerBuilder::new(options)
    }

    /// Log a message at the given severity
    pub fn log(&self, severity: Severity, message: impl Into<Message>) {
        self.core.log(severity, &message.into());
    }

    pub fn info(&self, message: impl Into<Message>) {
        self.log(Severity::Info, message);
    }

    pub fn warn(&self, message: impl Into<Message>) {
        self.log(Severity::Warn, message);
    }

    pub fn error(&self, message: impl Into<Message>) {
        self.log(Severity::Error, message);
    }

    /// Log a debug message
    ///
    /// The line is always persisted; it is printed only when debug output is
    /// enabled.
    pub fn debug(&self, message: impl Into<Message>) {
        self.log(Severity::Debug, message);
    }

    /// Append all pending lines to today's log file
    ///
    /// Succeeds without touching the filesystem when nothing is pending. On
    /// failure the pending lines are kept for the next attempt. This call
    /// blocks on file I/O.
    pub fn save(&self) -> Result<(), LogError> {
        self.core.save()
    }

    /// Lines logged since the last successful save
    pub fn pending(&self) -> String {
        self.core.pending.snapshot()
    }

    pub fn options(&self) -> &LoggerOptions {
        self.core.options()
    }

    /// Today's date bucket (`YYYY-MM-DD`) in the logger's local time
    pub fn today(&self) -> String {
        self.core.formatter.date_stamp(Utc::now())
    }

    /// Flush this logger and terminate the process when any thread panics
    ///
    /// The panic hook is installed once per process; every logger that calls
    /// this is flushed by it.
    pub fn install_fatal_handler(&self) {
        fatal::register(&self.core);
    }

    /// Spawn the flush daemon onto the current Tokio runtime
    ///
    /// The daemon stops once every handle to this logger has been dropped.
    pub fn spawn_daemon(&self) -> JoinHandle<()> {
        tokio::spawn(Daemon::new(self.downgrade()).run())
    }

    pub(crate) fn downgrade(&self) -> Weak<Core> {
        Arc::downgrade(&self.core)
    }
}

/// Builder for a `Logger` with non-default sink, console or clock offset
pub struct LoggerBuilder {
    options: LoggerOptions,
    sink: Option<Box<dyn LogSink>>,
    console: Option<Box<dyn Output>>,
    offset: Option<FixedOffset>,
}

impl LoggerBuilder {
    pub fn new(options: LoggerOptions) -> Self {
        Self {
            options,
            sink: None,
            console: None,
            offset: None,
        }
    }

    /// Sets where flushed lines go. Defaults to daily files under the
    /// configured path.
    pub fn sink(mut self, sink: Box<dyn LogSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Sets the console output. Defaults to standard out.
    pub fn console(mut self, console: Box<dyn Output>) -> Self {
        self.console = Some(console);
        self
    }

    /// Overrides the local UTC offset captured at build time
    pub fn utc_offset(mut self, offset: FixedOffset) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Builds the logger without a flush daemon
    pub fn build(self) -> Logger {
        let mut formatter = Formatter::new(&self.options);
        if let Some(offset) = self.offset {
            formatter = formatter.with_offset(offset);
        }
        let sink = self
            .sink
            .unwrap_or_else(|| Box::new(DailyFileSink::new(self.options.path.clone())));
        let console = self.console.unwrap_or_else(|| Box::new(Stdout::new()));

        Logger {
            core: Arc::new(Core {
                options: self.options,
                formatter,
                pending: PendingBuffer::new(),
                save_lock: Mutex::new(()),
                sink,
                console: Mutex::new(console),
            }),
        }
    }

    /// Builds the logger and spawns its flush daemon on the current Tokio
    /// runtime
    pub fn start(self) -> Logger {
        let logger = self.build();
        logger.spawn_daemon();
        logger
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// In-memory sink that fails a configurable number of appends
    #[derive(Clone, Default)]
    pub struct FlakySink {
        pub written: Arc<Mutex<Vec<(String, Vec<u8>)>>>,
        pub failures_left: Arc<AtomicUsize>,
        pub appends: Arc<AtomicUsize>,
        pub prepares: Arc<AtomicUsize>,
    }

    impl FlakySink {
        pub fn failing(times: usize) -> Self {
            let sink = Self::default();
            sink.failures_left.store(times, Ordering::SeqCst);
            sink
        }

        pub fn contents(&self) -> String {
            self.written
                .lock()
                .unwrap()
                .iter()
                .map(|(_, bytes)| String::from_utf8_lossy(bytes).into_owned())
                .collect()
        }
    }

    impl LogSink for FlakySink {
        fn prepare(&self) -> Result<(), LogError> {
            self.prepares.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn append(&self, date: &str, bytes: &[u8]) -> Result<(), LogError> {
            self.appends.fetch_add(1, Ordering::SeqCst);
            let failing = self
                .failures_left
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok();
            if failing {
                return Err(LogError::Append {
                    path: format!("{}.log", date).into(),
                    source: std::io::Error::new(std::io::ErrorKind::Other, "simulated failure"),
                });
            }
            self.written
                .lock()
                .unwrap()
                .push((date.to_string(), bytes.to_vec()));
            Ok(())
        }
    }
}
