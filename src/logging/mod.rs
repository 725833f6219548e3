//! Building blocks of a logger
//!
//! Provides line formatting, message conversion, the pending buffer, daily
//! file storage, console outputs and the `tracing` bridge.

pub mod console;
mod format;
mod layer;
mod message;
mod pending;
mod severity;
mod sink;

pub use console::{Output, Stdout};
pub use format::{align_text, Formatter, LogLine, DIVIDER};
pub use layer::{LoggerLayer, INTERNAL_TARGET};
pub use message::{Message, PLACEHOLDER};
pub use pending::PendingBuffer;
pub use severity::Severity;
pub use sink::{log_file_path, DailyFileSink, LogSink};
