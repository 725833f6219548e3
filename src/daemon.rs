//! Background flush daemon
//!
//! The daemon first makes sure the log directory exists, then flushes the
//! pending buffer, waiting `save_interval` after each completed attempt.
//! Failures are logged through the logger itself and retried after
//! `retry_delay`. A failed flush sends the daemon back to bootstrapping, so a
//! directory removed while the process runs is recreated on the next attempt.

use std::sync::Weak;
use std::time::Duration;

use tracing::{debug, trace};

use crate::error::LogError;
use crate::logger::Core;
use crate::logging::{Message, Severity, INTERNAL_TARGET};

/// Daemon phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DaemonState {
    /// Creating the log directory
    Bootstrapping,
    /// Periodically flushing the pending buffer
    Running,
}

pub(crate) struct Daemon {
    core: Weak<Core>,
    save_interval: Duration,
    retry_delay: Duration,
}

impl Daemon {
    pub(crate) fn new(core: Weak<Core>) -> Self {
        let (save_interval, retry_delay) = core
            .upgrade()
            .map(|core| (core.options().save_interval(), core.options().retry_delay()))
            .unwrap_or_default();
        Self {
            core,
            save_interval,
            retry_delay,
        }
    }

    /// Run until every handle to the logger is gone
    pub(crate) async fn run(self) {
        let mut state = DaemonState::Bootstrapping;
        loop {
            state = match state {
                DaemonState::Bootstrapping => {
                    let Some(result) = self.attempt(Core::prepare).await else {
                        break;
                    };
                    match result {
                        Ok(()) => {
                            debug!(target: INTERNAL_TARGET, "log directory ready");
                            DaemonState::Running
                        }
                        Err(err) => {
                            self.report(&err);
                            tokio::time::sleep(self.retry_delay).await;
                            DaemonState::Bootstrapping
                        }
                    }
                }
                DaemonState::Running => {
                    let Some(result) = self.attempt(Core::save).await else {
                        break;
                    };
                    match result {
                        Ok(()) => {
                            tokio::time::sleep(self.save_interval).await;
                            DaemonState::Running
                        }
                        Err(err) => {
                            self.report(&err);
                            tokio::time::sleep(self.retry_delay).await;
                            DaemonState::Bootstrapping
                        }
                    }
                }
            };
        }
        trace!(target: INTERNAL_TARGET, "logger dropped, flush daemon exiting");
    }

    /// Run a blocking operation against the logger, or `None` if it is gone
    async fn attempt<F>(&self, op: F) -> Option<Result<(), LogError>>
    where
        F: FnOnce(&Core) -> Result<(), LogError> + Send + 'static,
    {
        let core = self.core.upgrade()?;
        let result = tokio::task::spawn_blocking(move || op(&core))
            .await
            .unwrap_or_else(|e| Err(LogError::Interrupted(e.to_string())));
        Some(result)
    }

    fn report(&self, err: &LogError) {
        debug!(
            target: INTERNAL_TARGET,
            error = %err,
            kind = err.kind().description(),
            "log persistence failed, retrying"
        );
        if let Some(core) = self.core.upgrade() {
            core.log(Severity::Error, &Message::from(err));
        }
    }
}
