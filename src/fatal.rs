//! Process-wide fatal error hook
//!
//! Loggers opt in with `Logger::install_fatal_handler`. The first registration
//! installs a panic hook; every registered logger that is still alive when a
//! panic happens prints a fatal line and flushes its pending buffer. The hook
//! that was installed before runs next, then the process exits. Panics inside
//! Tokio tasks go through the same hook.

use std::any::Any;
use std::backtrace::{Backtrace, BacktraceStatus};
use std::panic::{self, Location};
use std::sync::{Arc, Mutex, MutexGuard, Once, PoisonError, Weak};

use crate::logger::Core;
use crate::logging::PLACEHOLDER;

/// Exit code used after a fatal error
pub const FATAL_EXIT_CODE: i32 = 101;

static REGISTRY: Mutex<Vec<Weak<Core>>> = Mutex::new(Vec::new());
static INSTALL: Once = Once::new();

fn registry() -> MutexGuard<'static, Vec<Weak<Core>>> {
    REGISTRY.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Add a logger to the fatal registry and install the panic hook once
pub(crate) fn register(core: &Arc<Core>) {
    track(core);

    INSTALL.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            let mut description = describe_panic(info.payload(), info.location());
            let backtrace = Backtrace::capture();
            if backtrace.status() == BacktraceStatus::Captured {
                description.push('\n');
                description.push_str(&backtrace.to_string());
            }

            report_fatal(&description);
            previous(info);
            std::process::exit(FATAL_EXIT_CODE);
        }));
    });
}

fn track(core: &Arc<Core>) {
    let core = Arc::downgrade(core);
    let mut registry = registry();
    registry.retain(|c| c.strong_count() > 0);
    if !registry.iter().any(|c| c.ptr_eq(&core)) {
        registry.push(core);
    }
}

/// Print and flush a fatal line on every registered logger that is alive
pub(crate) fn report_fatal(description: &str) -> usize {
    let cores: Vec<Arc<Core>> = registry().iter().filter_map(Weak::upgrade).collect();
    for core in &cores {
        core.fatal(description);
    }
    cores.len()
}

/// Text describing a panic payload and where it happened
pub fn describe_panic(payload: &(dyn Any + Send), location: Option<&Location<'_>>) -> String {
    let message = if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        PLACEHOLDER.to_string()
    };

    match location {
        Some(location) => format!(
            "panicked at {}:{}:{}: {}",
            location.file(),
            location.line(),
            location.column(),
            message
        ),
        None => format!("panicked: {}", message),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LoggerOptions;
    use crate::logger::testing::FlakySink;
    use crate::logger::Logger;
    use crate::logging::console::testing::Capture;
    use crate::logging::Output;
    use std::io::{self, Read, Write};
    use std::path::{Path, PathBuf};
    use std::process::{Command, ExitStatus, Stdio};
    use std::time::{Duration, Instant};
    use tempfile::TempDir;

    /// Set in a re-executed test binary to the directory the child logs into
    const CHILD_LOG_DIR: &str = "DAYLOG_FATAL_CHILD_LOG_DIR";
    const CHILD_TIMEOUT: Duration = Duration::from_secs(30);

    fn child_log_dir() -> Option<PathBuf> {
        std::env::var_os(CHILD_LOG_DIR).map(PathBuf::from)
    }

    /// Re-run a single test of this binary in a child process logging to `dir`
    ///
    /// Returns `None` if the child had to be killed after `CHILD_TIMEOUT`.
    fn run_child(test: &str, dir: &Path) -> Option<(ExitStatus, String)> {
        let mut child = Command::new(std::env::current_exe().unwrap())
            .args([test, "--exact", "--nocapture", "--test-threads=1"])
            .env(CHILD_LOG_DIR, dir)
            .env_remove("RUST_BACKTRACE")
            .env_remove("RUST_LIB_BACKTRACE")
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .unwrap();

        let deadline = Instant::now() + CHILD_TIMEOUT;
        let status = loop {
            if let Some(status) = child.try_wait().unwrap() {
                break status;
            }
            if Instant::now() >= deadline {
                let _ = child.kill();
                let _ = child.wait();
                return None;
            }
            std::thread::sleep(Duration::from_millis(20));
        };

        let mut stderr = String::new();
        if let Some(mut pipe) = child.stderr.take() {
            pipe.read_to_string(&mut stderr).unwrap();
        }
        Some((status, stderr))
    }

    fn read_logs(dir: &Path) -> String {
        let mut content = String::new();
        for entry in std::fs::read_dir(dir).unwrap() {
            let path = entry.unwrap().path();
            if path.extension().map_or(false, |ext| ext == "log") {
                content.push_str(&std::fs::read_to_string(path).unwrap());
            }
        }
        content
    }

    /// Console whose writes panic
    struct PanickingOutput;

    impl Write for PanickingOutput {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            panic!("console boom");
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl Output for PanickingOutput {}

    #[test]
    fn test_describe_str_payload() {
        let payload: Box<dyn Any + Send> = Box::new("boom");
        let location = Location::caller();
        let description = describe_panic(payload.as_ref(), Some(location));

        assert!(description.starts_with("panicked at "));
        assert!(description.contains(location.file()));
        assert!(description.ends_with(": boom"));
    }

    #[test]
    fn test_describe_string_payload() {
        let payload: Box<dyn Any + Send> = Box::new(String::from("formatted 7"));
        assert_eq!(describe_panic(payload.as_ref(), None), "panicked: formatted 7");
    }

    #[test]
    fn test_describe_unknown_payload() {
        let payload: Box<dyn Any + Send> = Box::new(42u8);
        assert_eq!(
            describe_panic(payload.as_ref(), None),
            format!("panicked: {}", PLACEHOLDER)
        );
    }

    // Exercises the registry without installing the process-wide hook, which
    // would terminate the test harness on the first failing assertion.
    #[test]
    fn test_registry_reports_live_loggers_once() {
        let sink = FlakySink::default();
        let capture = Capture::default();
        let logger = Logger::builder(LoggerOptions::default().with_system("fatal-test"))
            .sink(Box::new(sink.clone()))
            .console(Box::new(capture.clone()))
            .build();

        let core = logger.downgrade().upgrade().unwrap();
        track(&core);
        track(&core);
        drop(core);
        logger.info("last words");

        report_fatal("panicked at src/lib.rs:1:1: test");

        let written = sink.contents();
        assert!(written.contains("last words"));
        assert_eq!(written.matches(" ¦ FATAL ¦ ").count(), 1);
        assert!(capture.contents().contains("panicked at src/lib.rs:1:1: test"));

        drop(logger);
        registry().retain(|c| c.strong_count() > 0);
        assert!(registry()
            .iter()
            .all(|c| c.upgrade().map_or(true, |c| c.options().system.name() != "fatal-test")));
    }

    #[test]
    fn test_panic_in_task_flushes_and_exits() {
        if let Some(dir) = child_log_dir() {
            let runtime = tokio::runtime::Runtime::new().unwrap();
            runtime.block_on(async {
                let logger = Logger::builder(LoggerOptions::default().with_path(&dir))
                    .console(Box::new(Capture::default()))
                    .start();
                logger.install_fatal_handler();
                logger.info("before");

                let _ = tokio::spawn(async { panic!("task boom") }).await;
            });
            // Reaching this point means the hook did not exit
            return;
        }

        let temp_dir = TempDir::new().unwrap();
        let (status, stderr) = run_child(
            "fatal::tests::test_panic_in_task_flushes_and_exits",
            temp_dir.path(),
        )
        .expect("child process hung");

        assert_eq!(status.code(), Some(FATAL_EXIT_CODE));
        let content = read_logs(temp_dir.path());
        assert!(content.contains(" ¦  INFO ¦ before\n"));
        assert!(content.contains(" ¦ FATAL ¦ \npanicked at "));
        assert!(content.contains(": task boom\n"));
        // The default hook still reports the panic
        assert!(stderr.contains("task boom"));
    }

    #[test]
    fn test_panicking_console_still_exits() {
        if let Some(dir) = child_log_dir() {
            let logger = Logger::builder(LoggerOptions::default().with_path(&dir))
                .console(Box::new(PanickingOutput))
                .build();
            logger.install_fatal_handler();
            logger.info("unprintable");
            return;
        }

        let temp_dir = TempDir::new().unwrap();
        let (status, stderr) = run_child(
            "fatal::tests::test_panicking_console_still_exits",
            temp_dir.path(),
        )
        .expect("child process hung");

        assert_eq!(status.code(), Some(FATAL_EXIT_CODE));
        let content = read_logs(temp_dir.path());
        assert!(content.contains(" ¦  INFO ¦ unprintable\n"));
        assert!(content.contains(": console boom\n"));
        // The fatal line went to stderr since the console was locked
        assert!(stderr.contains("FATAL"));
    }
}
