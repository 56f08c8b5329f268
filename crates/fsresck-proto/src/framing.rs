//! Shared helper for reading a fixed number of bytes off of a stream, distinguishing a clean
//! end-of-stream from a truncated frame.

use std::io::{ErrorKind, Read};

use crate::error::{Error, Result};

/// Read exactly `buf.len()` bytes, retrying on [`ErrorKind::Interrupted`].
///
/// Unlike [`Read::read_exact`], this reports how many bytes were actually read before the stream
/// ran dry, via [`Error::Truncated`].
pub(crate) fn read_exact_or_truncated<R: Read + ?Sized>(reader: &mut R, buf: &mut [u8]) -> Result<()> {
    let mut read = 0;
    while read < buf.len() {
        match reader.read(&mut buf[read..]) {
            Ok(0) => break,
            Ok(n) => read += n,
            Err(err) if err.kind() == ErrorKind::Interrupted => {}
            Err(err) => return Err(Error::Io(err)),
        }
    }

    if read == buf.len() {
        Ok(())
    } else {
        Err(Error::Truncated { expected: buf.len(), read })
    }
}
