//! Response framing.
//!
//! A response is zero or more payload lines followed by one empty line.
//! The empty-line terminator lets clients read multi-line listings
//! without knowing their length in advance.

use std::io::Write;

use super::errors::DispatchError;

/// Writes framed responses to a connection.
pub struct ResponseWriter<W> {
    writer: W,
}

impl<W: Write> ResponseWriter<W> {
    /// Creates a response writer wrapping the given output stream.
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Writes one response payload followed by the empty-line terminator
    /// and flushes.
    ///
    /// An empty payload produces just the terminator. Interior newlines
    /// in the payload become payload lines.
    ///
    /// # Errors
    ///
    /// Returns an error when writing to the stream fails.
    pub fn write_response(&mut self, payload: &str) -> Result<(), DispatchError> {
        for line in payload.lines() {
            self.writer.write_all(line.as_bytes())?;
            self.writer.write_all(b"\n")?;
        }
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;
        Ok(())
    }
}
