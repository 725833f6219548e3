//! Bridge from `tracing` events into a daylog logger
//!
//! Installing `LoggerLayer` on a `tracing_subscriber` registry sends every
//! event through the logger, so `tracing::info!` and friends end up on the
//! console and in the daily files with the same layout as direct calls.

use std::fmt::Debug;

use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::{Context, Layer};

use crate::logger::Logger;

use super::severity::Severity;

/// Target of this crate's own diagnostics. Events with this target are not
/// forwarded, so the flush daemon never feeds the buffer it is flushing.
pub const INTERNAL_TARGET: &str = "daylog::internal";

/// A `tracing_subscriber` layer that forwards events to a `Logger`
#[derive(Debug, Clone)]
pub struct LoggerLayer {
    logger: Logger,
}

impl LoggerLayer {
    pub fn new(logger: Logger) -> Self {
        Self { logger }
    }
}

impl<S: Subscriber> Layer<S> for LoggerLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        if metadata.target() == INTERNAL_TARGET {
            return;
        }

        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);
        self.logger
            .log(Severity::from(*metadata.level()), visitor.finish());
    }
}

/// Collects the `message` field and renders other fields as `key=value`
#[derive(Default)]
struct MessageVisitor {
    message: String,
    fields: Vec<String>,
}

impl MessageVisitor {
    fn finish(self) -> String {
        if self.fields.is_empty() {
            return self.message;
        }
        let fields = self.fields.join(" ");
        if self.message.is_empty() {
            fields
        } else {
            format!("{} {}", self.message, fields)
        }
    }
}

impl Visit for MessageVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        } else {
            self.fields.push(format!("{}={}", field.name(), value));
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn Debug) {
        if field.name() == "message" {
            self.message = format!("{:?}", value);
        } else {
            self.fields.push(format!("{}={:?}", field.name(), value));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LoggerOptions;
    use crate::logger::testing::FlakySink;
    use crate::logging::console::testing::Capture;
    use tracing_subscriber::layer::SubscriberExt;

    fn test_logger(capture: &Capture) -> Logger {
        Logger::builder(LoggerOptions::default().with_debug(false))
            .sink(Box::new(FlakySink::default()))
            .console(Box::new(capture.clone()))
            .build()
    }

    #[test]
    fn test_events_are_forwarded() {
        let capture = Capture::default();
        let logger = test_logger(&capture);
        let subscriber =
            tracing_subscriber::registry().with(LoggerLayer::new(logger.clone()));

        tracing::subscriber::with_default(subscriber, || {
            tracing::info!(target: "app", "listening");
            tracing::warn!(target: "app", port = 8080, "port busy");
            tracing::debug!(target: "app", "quiet");
            tracing::info!(target: INTERNAL_TARGET, "internal");
        });

        let pending = logger.pending();
        let lines: Vec<&str> = pending.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].ends_with(" ¦  INFO ¦ listening"));
        assert!(lines[1].ends_with(" ¦  WARN ¦ port busy port=8080"));
        assert!(lines[2].ends_with(" ¦ DEBUG ¦ quiet"));

        // Debug output is disabled for this logger
        assert_eq!(capture.lines().len(), 2);
    }
}
