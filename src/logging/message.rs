//! Conversion of logged values into message text

use std::fmt::{self, Write as _};

use serde::Serialize;

/// Text used when a value cannot be rendered
pub const PLACEHOLDER: &str = "UNKNOWN";

/// Message text of a log line
///
/// Strings pass through unchanged, numbers render as decimal text, errors
/// render with their source chain and structured values render as indented
/// JSON surrounded by blank lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message(String);

impl Message {
    /// Render any `Display` value, falling back to the placeholder on failure
    pub fn display(value: &dyn fmt::Display) -> Self {
        let mut text = String::new();
        match write!(text, "{}", value) {
            Ok(()) => Message(text),
            Err(_) => Message(PLACEHOLDER.to_string()),
        }
    }

    /// Render an error followed by its chain of sources
    pub fn error(err: &(dyn std::error::Error + 'static)) -> Self {
        let mut text = Self::display(&err).0;
        let mut source = err.source();
        while let Some(cause) = source {
            text.push_str("\n    caused by: ");
            text.push_str(&Self::display(&cause).0);
            source = cause.source();
        }
        Message(text)
    }

    /// Render a serializable value as one-space indented JSON
    pub fn structured<T: Serialize + ?Sized>(value: &T) -> Self {
        let mut json = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b" ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut json, formatter);
        if value.serialize(&mut serializer).is_err() {
            return Message(PLACEHOLDER.to_string());
        }
        match String::from_utf8(json) {
            Ok(json) => Message(format!("\n\n{}\n", json)),
            Err(_) => Message(PLACEHOLDER.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for Message {
    fn from(text: String) -> Self {
        Message(text)
    }
}

impl From<&str> for Message {
    fn from(text: &str) -> Self {
        Message(text.to_string())
    }
}

impl From<&String> for Message {
    fn from(text: &String) -> Self {
        Message(text.clone())
    }
}

impl From<fmt::Arguments<'_>> for Message {
    fn from(args: fmt::Arguments<'_>) -> Self {
        Self::display(&args)
    }
}

macro_rules! numeric_message {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Message {
                fn from(value: $t) -> Self {
                    Message(value.to_string())
                }
            }
        )*
    };
}

numeric_message!(i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64);

impl From<serde_json::Value> for Message {
    fn from(value: serde_json::Value) -> Self {
        Self::structured(&value)
    }
}

impl From<&serde_json::Value> for Message {
    fn from(value: &serde_json::Value) -> Self {
        Self::structured(value)
    }
}

impl From<std::io::Error> for Message {
    fn from(err: std::io::Error) -> Self {
        Self::error(&err)
    }
}

impl From<&crate::LogError> for Message {
    fn from(err: &crate::LogError) -> Self {
        Self::error(err)
    }
}

impl From<crate::LogError> for Message {
    fn from(err: crate::LogError) -> Self {
        Self::error(&err)
    }
}

/// Renders the full report, including a captured backtrace
impl From<anyhow::Error> for Message {
    fn from(err: anyhow::Error) -> Self {
        Self::from(&err)
    }
}

impl From<&anyhow::Error> for Message {
    fn from(err: &anyhow::Error) -> Self {
        Message(format!("{:?}", err))
    }
}
