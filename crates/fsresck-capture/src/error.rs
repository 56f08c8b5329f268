use std::io::Error as IoError;

use thiserror::Error;

/// Errors surfaced to the block-device server host that embeds [`crate::CapturePlugin`].
#[derive(Error, Debug)]
pub enum Error {
    /// An unrecognized `key=value` configuration pair, or a required one missing.
    #[error("bad argument: {0}")]
    BadArgument(String),

    /// A `zero` call with `may_trim = false`: the plugin never discards data it hasn't logged.
    #[error("operation not supported on this handle: {0}")]
    Unsupported(String),

    /// I/O failure on the backing disk.
    #[error("I/O error on backing disk: {0}")]
    Io(#[from] IoError),

    /// The write-log could not be appended to.
    #[error("write-log error: {0}")]
    Log(#[from] fsresck_log::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
