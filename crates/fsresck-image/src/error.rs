use std::io::Error as IoError;

use thiserror::Error;

/// Errors raised while materializing or cleaning up a candidate disk image.
#[derive(Error, Debug)]
pub enum Error {
    /// The caller passed a null/empty argument where a real one was required.
    #[error("bad argument: {0}")]
    BadArgument(String),

    /// The CoW (or fallback) clone of the base image failed.
    #[error("failed to clone base image {base:?} to {dest:?}: {source}")]
    FSCopy { base: std::path::PathBuf, dest: std::path::PathBuf, #[source] source: IoError },

    /// Underlying I/O failure creating the temp file or applying a pending write.
    #[error("I/O error materializing image: {0}")]
    Io(#[from] IoError),
}

pub type Result<T> = std::result::Result<T, Error>;
