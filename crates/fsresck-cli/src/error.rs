use std::io::Error as IoError;

use thiserror::Error;

/// Errors that can terminate the CLI's run entirely (as opposed to a single candidate's
/// materialization failure, which is reported and skipped).
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] IoError),

    #[error(transparent)]
    Pipeline(#[from] fsresck_pipeline::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
