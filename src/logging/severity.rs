//! Log severities

use crossterm::style::Color;

/// Severity of a log line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    Info,
    Warn,
    Error,
    Debug,
    Fatal,
}

impl Severity {
    /// Lower-case name of this severity
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Warn => "warn",
            Severity::Error => "error",
            Severity::Debug => "debug",
            Severity::Fatal => "fatal",
        }
    }

    /// Console color of the severity column
    pub fn color(&self) -> Color {
        match self {
            Severity::Info => Color::Green,
            Severity::Warn => Color::Yellow,
            Severity::Error => Color::Red,
            Severity::Debug => Color::Blue,
            Severity::Fatal => Color::Cyan,
        }
    }

    /// Whether the debug visibility flag applies to this severity
    pub fn is_suppressible(&self) -> bool {
        matches!(self, Severity::Debug)
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<tracing::Level> for Severity {
    fn from(level: tracing::Level) -> Self {
        match level {
            tracing::Level::TRACE => Severity::Debug,
            tracing::Level::DEBUG => Severity::Debug,
            tracing::Level::INFO => Severity::Info,
            tracing::Level::WARN => Severity::Warn,
            tracing::Level::ERROR => Severity::Error,
        }
    }
}
