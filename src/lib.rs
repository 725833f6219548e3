//! daylog - leveled console logging with buffered persistence to daily files
//!
//! Log calls print a colorized line immediately and queue the plain line in
//! memory. A background daemon appends queued lines to `<path>/<YYYY-MM-DD>.log`
//! on a fixed delay, retrying and recreating the directory when writes fail.

pub mod config;
mod daemon;
pub mod error;
pub mod fatal;
pub mod logger;
pub mod logging;

pub use config::{LoggerOptions, SystemName};
pub use error::{DiskErrorKind, LogError};
pub use logger::{Logger, LoggerBuilder};
pub use logging::{LoggerLayer, Message, Severity};
