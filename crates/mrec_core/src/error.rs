//! Error types for measurement record decoding.

use std::io;
use thiserror::Error;

/// Failures raised while configuring or driving a record reader.
///
/// Configuration errors surface at construction time; every other variant is
/// raised by a read operation and leaves the reader in an unspecified state.
#[derive(Debug, Error)]
pub enum RecordError {
    /// The borrowed input stream failed.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Invalid format or record-size combination.
    #[error("Invalid reader configuration: {0}")]
    Configuration(String),

    /// A token in the input does not follow the format's grammar.
    #[error("Malformed input at byte {offset}: {message}")]
    MalformedInput { offset: u64, message: String },

    /// A bit was requested after the current record ended.
    #[error("Attempt to read past end-of-record")]
    EndOfRecord,

    /// A bit was requested after the stream ran out of data.
    #[error("Attempt to read past end-of-file")]
    EndOfStream,
}

impl RecordError {
    pub(crate) fn malformed(offset: u64, message: impl Into<String>) -> Self {
        RecordError::MalformedInput {
            offset,
            message: message.into(),
        }
    }

    /// Returns true for errors caused by reader construction parameters.
    pub fn is_configuration(&self) -> bool {
        matches!(self, RecordError::Configuration(_))
    }
}

/// Result type alias for record reading operations.
pub type Result<T> = std::result::Result<T, RecordError>;
