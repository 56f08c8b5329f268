//! The write-log data model: the `Write` record type and big-endian framing used to persist and
//! replay a sequence of captured block writes.

pub mod error;
pub mod header;
pub mod reader;
pub mod write;
pub mod writer;

pub use error::{Error, Result};
pub use header::{LogHeader, HEADER_LEN, OP_NONE, OP_WRITE};
pub use reader::LogReader;
pub use write::{overlapping, Write};
pub use writer::LogWriter;
