//! Console destinations for display lines

use std::io::{self, Write};

/// A console destination, for example standard out
pub trait Output: Write + Send {}

/// Writes display lines to `stdout`
pub struct Stdout {
    writer: io::Stdout,
}

impl Default for Stdout {
    fn default() -> Self {
        Self::new()
    }
}

impl Stdout {
    pub fn new() -> Self {
        Self {
            writer: io::stdout(),
        }
    }
}

impl Write for Stdout {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.writer.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}

impl Output for Stdout {}

/// Write one display line followed by a newline
pub(crate) fn print_line(output: &mut dyn Output, line: &str) -> io::Result<()> {
    output.write_all(line.as_bytes())?;
    output.write_all(b"\n")?;
    output.flush()
}
