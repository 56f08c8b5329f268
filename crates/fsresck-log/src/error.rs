use std::io::Error as IoError;

use thiserror::Error;

/// Errors raised while reading or writing a write-log.
#[derive(Error, Debug)]
pub enum Error {
    /// The log ended in the middle of a header or a record's payload.
    #[error("write log truncated: expected {expected} bytes, found {found}")]
    TruncatedFile { expected: usize, found: usize },

    /// A header's `operation` field, or some other field, had a value the format does not allow.
    #[error("malformed write-log record: {0}")]
    ProtocolState(String),

    /// Underlying I/O failure reading from or writing to the log file.
    #[error("I/O error on write log: {0}")]
    Io(#[from] IoError),
}

pub type Result<T> = std::result::Result<T, Error>;
