use std::io;

use thiserror::Error;

use crate::registry::RegistryError;
use crate::session::SessionError;

/// Errors surfaced while serving a connection.
///
/// Protocol-level failures (unknown commands, authorization and state
/// errors) never appear here; they become canonical response strings and
/// the connection stays open. These variants end the connection.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The request line matched no recognised command. Recovered inside
    /// the dispatcher; carried as an error for logging and parse tests.
    #[error("unrecognised command: {input}")]
    UnknownCommand { input: String },

    /// A request line exceeded the size bound.
    #[error("command line too long: {size} bytes exceeds {max} byte limit")]
    LineTooLong { size: usize, max: usize },

    /// Socket IO failed; triggers disconnect cleanup.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Listing serialization failed.
    #[error("failed to serialize listing entry: {0}")]
    SerializeListing(#[from] serde_json::Error),

    /// Registry failure that no response string covers (lock poisoning).
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// Session table failure.
    #[error(transparent)]
    Session(#[from] SessionError),
}

impl DispatchError {
    /// Creates an unknown-command error.
    pub fn unknown_command(input: impl Into<String>) -> Self {
        Self::UnknownCommand {
            input: input.into(),
        }
    }

    /// Creates a line-too-long error.
    pub fn line_too_long(size: usize, max: usize) -> Self {
        Self::LineTooLong { size, max }
    }
}
