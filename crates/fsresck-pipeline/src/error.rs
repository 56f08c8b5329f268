use thiserror::Error;

/// Errors raised while slicing, fragmenting, or shuffling a write stream.
#[derive(Error, Debug)]
pub enum Error {
    /// A required argument was missing or empty where a concrete value was needed.
    #[error("bad argument: {0}")]
    BadArgument(String),

    /// The upstream write-log could not be decoded.
    #[error(transparent)]
    Log(#[from] fsresck_log::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
