use std::io::Error as IoError;

use thiserror::Error;

/// Errors produced while framing or parsing NBD requests and replies.
#[derive(Error, Debug)]
pub enum Error {
    /// The magic number at the start of a request or reply did not match the expected constant.
    #[error("NBD frame magic mismatch: expected {expected:#010x}, got {found:#010x}")]
    ProtocolMagic { expected: u32, found: u32 },

    /// A request carried an operation type the core has no behavior for, or a reply carried a
    /// nonzero error code that the caller asked not to be recovered from transparently.
    #[error("unexpected NBD protocol state: {0}")]
    ProtocolState(String),

    /// The peer closed the connection (or the backing stream ran out) before a full frame, or a
    /// frame's declared payload, could be read.
    #[error("truncated NBD frame: expected {expected} bytes, read {read}")]
    Truncated { expected: usize, read: usize },

    /// Underlying I/O failure reading from or writing to the wire.
    #[error("I/O error on NBD stream: {0}")]
    Io(#[from] IoError),
}

pub type Result<T> = std::result::Result<T, Error>;
