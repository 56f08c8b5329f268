//! Pull-based decoding of a write-log into a stream of [`Write`]s.

use std::io::Read;

use tracing::{debug, trace};

use crate::error::{Error, Result};
use crate::header::{LogHeader, HEADER_LEN, OP_NONE, OP_WRITE};
use crate::write::Write as LoggedWrite;

/// Reads a write-log record by record, yielding one [`LoggedWrite`] per `operation = OP_WRITE`
/// record.
///
/// `operation = OP_NONE` records are no-ops left behind by the capture side; the reader consumes
/// their payload to stay frame-aligned but does not surface them, so callers never have to special
/// case them.
#[derive(Debug)]
pub struct LogReader<R> {
    inner: R,
    disk_id: Option<u64>,
    exhausted: bool,
}

impl<R: Read> LogReader<R> {
    /// Wrap `inner` as a write-log stream. `disk_id` is stamped onto every yielded [`LoggedWrite`];
    /// pass `None` for a single-disk capture.
    pub fn new(inner: R, disk_id: Option<u64>) -> Self {
        Self { inner, disk_id, exhausted: false }
    }

    fn read_header(&mut self) -> Result<Option<LogHeader>> {
        let mut buf = [0u8; HEADER_LEN];
        let mut read = 0;
        while read < HEADER_LEN {
            match self.inner.read(&mut buf[read..]) {
                Ok(0) if read == 0 => return Ok(None),
                Ok(0) => {
                    return Err(Error::TruncatedFile { expected: HEADER_LEN, found: read });
                }
                Ok(n) => read += n,
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => {}
                Err(e) => return Err(Error::Io(e)),
            }
        }
        LogHeader::decode(&buf).map(Some)
    }

    fn read_payload(&mut self, length: usize) -> Result<Vec<u8>> {
        let mut data = vec![0u8; length];
        self.inner.read_exact(&mut data).map_err(|e| {
            if e.kind() == std::io::ErrorKind::UnexpectedEof {
                Error::TruncatedFile { expected: length, found: 0 }
            } else {
                Error::Io(e)
            }
        })?;
        Ok(data)
    }

    fn next_record(&mut self) -> Result<Option<LoggedWrite>> {
        loop {
            let Some(header) = self.read_header()? else {
                return Ok(None);
            };

            let length = usize::try_from(header.length)
                .map_err(|_| Error::ProtocolState(format!("record length {} out of range", header.length)))?;

            if header.operation == OP_NONE {
                trace!(offset = header.offset, length, "skipping no-op log record");
                let _ = self.read_payload(length)?;
                continue;
            }

            debug_assert_eq!(header.operation, OP_WRITE);
            let data = self.read_payload(length)?;
            debug!(offset = header.offset, length, "decoded write-log record");

            let mut write = LoggedWrite::new(header.offset, data);
            if let Some(disk_id) = self.disk_id {
                write = write.with_disk_id(disk_id);
            }
            write.set_times(header.start_time, header.end_time);
            return Ok(Some(write));
        }
    }
}

impl<R: Read> Iterator for LogReader<R> {
    type Item = Result<LoggedWrite>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.exhausted {
            return None;
        }
        match self.next_record() {
            Ok(Some(write)) => Some(Ok(write)),
            Ok(None) => {
                self.exhausted = true;
                None
            }
            Err(e) => {
                self.exhausted = true;
                Some(Err(e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::LogHeader;

    fn record(operation: u32, offset: u64, payload: &[u8]) -> Vec<u8> {
        let header = LogHeader {
            operation,
            start_time: 1.0,
            end_time: 2.0,
            offset,
            length: i32::try_from(payload.len()).unwrap(),
        };
        let mut bytes = header.encode().to_vec();
        bytes.extend_from_slice(payload);
        bytes
    }

    #[test]
    fn yields_one_write_per_write_record() {
        let mut log = Vec::new();
        log.extend(record(OP_WRITE, 0, b"abcd"));
        log.extend(record(OP_WRITE, 4096, b"wxyz"));

        let writes: Result<Vec<_>> = LogReader::new(&log[..], None).collect();
        let writes = writes.unwrap();
        assert_eq!(writes.len(), 2);
        assert_eq!(writes[0].offset, 0);
        assert_eq!(writes[0].data, b"abcd");
        assert_eq!(writes[1].offset, 4096);
    }

    #[test]
    fn skips_no_op_records_transparently() {
        let mut log = Vec::new();
        log.extend(record(OP_NONE, 0, b"ignored"));
        log.extend(record(OP_WRITE, 512, b"data"));
        log.extend(record(OP_NONE, 0, b""));

        let writes: Result<Vec<_>> = LogReader::new(&log[..], None).collect();
        let writes = writes.unwrap();
        assert_eq!(writes.len(), 1);
        assert_eq!(writes[0].offset, 512);
    }

    #[test]
    fn stamps_the_given_disk_id() {
        let log = record(OP_WRITE, 0, b"x");
        let writes: Result<Vec<_>> = LogReader::new(&log[..], Some(7)).collect();
        assert_eq!(writes.unwrap()[0].disk_id, Some(7));
    }

    #[test]
    fn empty_stream_yields_nothing() {
        let log: Vec<u8> = Vec::new();
        let writes: Result<Vec<_>> = LogReader::new(&log[..], None).collect();
        assert!(writes.unwrap().is_empty());
    }

    #[test]
    fn truncated_header_is_an_error() {
        let log = vec![0u8; 10];
        let mut reader = LogReader::new(&log[..], None);
        assert!(matches!(reader.next(), Some(Err(Error::TruncatedFile { .. }))));
    }

    #[test]
    fn truncated_payload_is_an_error() {
        let mut log = record(OP_WRITE, 0, b"abcd");
        log.truncate(log.len() - 2);
        let mut reader = LogReader::new(&log[..], None);
        assert!(matches!(reader.next(), Some(Err(Error::TruncatedFile { .. }))));
    }
}
