//! Log line formatting
//!
//! Every line is rendered twice: a plain form that goes to the daily file and
//! a colorized form for the console. Both share the column layout
//! `<date> ¦ [<cluster>] <system> ¦ <severity> ¦ <message>`.

use chrono::{DateTime, FixedOffset, Local, Utc};
use crossterm::style::{style, Color, Stylize};

use crate::config::LoggerOptions;

use super::severity::Severity;

/// Column divider shared by both forms
pub const DIVIDER: &str = " ¦ ";

const SEVERITY_WIDTH: usize = 5;
const CLUSTER_WIDTH: usize = 2;

/// A formatted log line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogLine {
    /// Plain text, newline terminated
    pub raw: String,
    /// ANSI colorized, without trailing newline
    pub display: String,
}

/// Fit `text` into exactly `width` characters
///
/// Shorter text is left-padded with `fill`. Longer text is cut to
/// `width - 2` characters followed by `..`.
pub fn align_text(text: &str, width: usize, fill: char) -> String {
    let len = text.chars().count();
    if len <= width {
        let mut aligned: String = std::iter::repeat(fill).take(width - len).collect();
        aligned.push_str(text);
        aligned
    } else {
        let mut aligned: String = text.chars().take(width.saturating_sub(2)).collect();
        aligned.push_str("..");
        aligned
    }
}

/// Formats log lines for one logger configuration
#[derive(Debug, Clone)]
pub struct Formatter {
    system: String,
    cluster: String,
    primary: bool,
    offset: FixedOffset,
}

impl Formatter {
    /// Create a formatter, capturing the local UTC offset once
    pub fn new(options: &LoggerOptions) -> Self {
        Self {
            system: align_text(
                &options.system.name().to_uppercase(),
                options.system.width(),
                '-',
            ),
            cluster: align_text(&options.cluster.to_string(), CLUSTER_WIDTH, '0'),
            primary: options.cluster == 0,
            offset: *Local::now().offset(),
        }
    }

    /// Replace the captured UTC offset
    pub fn with_offset(mut self, offset: FixedOffset) -> Self {
        self.offset = offset;
        self
    }

    /// `YYYY-MM-DD HH:MM:SS` in local wall-clock time
    pub fn timestamp(&self, now: DateTime<Utc>) -> String {
        now.with_timezone(&self.offset)
            .format("%Y-%m-%d %H:%M:%S")
            .to_string()
    }

    /// `YYYY-MM-DD` in local wall-clock time, used to name the day's file
    pub fn date_stamp(&self, now: DateTime<Utc>) -> String {
        now.with_timezone(&self.offset)
            .format("%Y-%m-%d")
            .to_string()
    }

    /// Format a message captured at `now`
    pub fn format(&self, severity: Severity, message: &str, now: DateTime<Utc>) -> LogLine {
        let date = self.timestamp(now);
        let severity_label =
            align_text(&severity.as_str().to_uppercase(), SEVERITY_WIDTH, ' ');
        let origin = format!("[{}] {}", self.cluster, self.system);

        let mut raw = [date.as_str(), origin.as_str(), severity_label.as_str(), message].join(DIVIDER);
        raw.push('\n');

        let divider = DIVIDER.dark_grey();
        let origin_color = if self.primary {
            Color::Cyan
        } else {
            Color::DarkCyan
        };
        let display = format!(
            "{}{divider}{}{divider}{}{divider}{message}",
            date.as_str().dark_grey(),
            style(origin).with(origin_color),
            style(severity_label).with(severity.color()),
        );

        LogLine { raw, display }
    }
}
