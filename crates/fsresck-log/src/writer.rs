//! Appending write-log records, with truncate-on-failure so a crash mid-append never leaves a
//! partial record for [`crate::reader::LogReader`] to choke on.

use std::fs::File;
use std::io::{Seek, SeekFrom, Write as IoWrite};

use tracing::warn;

use crate::error::{Error, Result};
use crate::header::{LogHeader, OP_WRITE};

/// Appends records to a write-log backed by a real file, so a failed append can be rolled back
/// with [`File::set_len`].
#[derive(Debug)]
pub struct LogWriter {
    file: File,
}

impl LogWriter {
    /// Wrap `file`; appends start at the file's current length.
    pub fn new(file: File) -> Self {
        Self { file }
    }

    /// Append one record. On any I/O failure partway through the write, truncates the file back
    /// to the offset the record started at, so the log never ends in a half-written record.
    pub fn append_write(
        &mut self,
        offset: u64,
        data: &[u8],
        start_time: f64,
        end_time: f64,
    ) -> Result<()> {
        let record_start = self.file.stream_position()?;

        let length = i32::try_from(data.len())
            .map_err(|_| Error::ProtocolState(format!("write payload of {} bytes too large for a log record", data.len())))?;
        let header = LogHeader { operation: OP_WRITE, start_time, end_time, offset, length };

        let mut buf = header.encode().to_vec();
        buf.extend_from_slice(data);

        if let Err(e) = self.file.write_all(&buf) {
            self.rollback(record_start);
            return Err(Error::Io(e));
        }
        if let Err(e) = self.file.flush() {
            self.rollback(record_start);
            return Err(Error::Io(e));
        }

        Ok(())
    }

    fn rollback(&mut self, record_start: u64) {
        if let Err(e) = self.file.set_len(record_start) {
            warn!(error = %e, "failed to truncate write log after a partial append");
            return;
        }
        if let Err(e) = self.file.seek(SeekFrom::Start(record_start)) {
            warn!(error = %e, "failed to reposition write log after truncation");
        }
    }

    /// Flush and hand back the underlying file, e.g. to reopen it for reading.
    pub fn into_inner(mut self) -> Result<File> {
        self.file.flush()?;
        Ok(self.file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::LogReader;
    use std::io::Read;
    use tempfile::NamedTempFile;

    fn reopened(file: &File) -> File {
        file.try_clone().unwrap()
    }

    #[test]
    fn appended_records_are_readable_back() {
        let tmp = NamedTempFile::new().unwrap();
        let file = tmp.reopen().unwrap();
        let mut writer = LogWriter::new(file);

        writer.append_write(0, b"abcd", 1.0, 1.1).unwrap();
        writer.append_write(4096, b"wxyz", 2.0, 2.1).unwrap();

        let mut readback = writer.into_inner().unwrap();
        readback.seek(SeekFrom::Start(0)).unwrap();
        let writes: Result<Vec<_>> = LogReader::new(readback, None).collect();
        let writes = writes.unwrap();
        assert_eq!(writes.len(), 2);
        assert_eq!(writes[0].offset, 0);
        assert_eq!(writes[1].offset, 4096);
    }

    #[test]
    fn rollback_restores_the_previous_length() {
        let tmp = NamedTempFile::new().unwrap();
        let file = tmp.reopen().unwrap();
        let mut writer = LogWriter::new(file);

        writer.append_write(0, b"abcd", 1.0, 1.1).unwrap();
        let len_after_first = reopened(&writer.file).metadata().unwrap().len();

        writer.rollback(len_after_first);
        let len_after_rollback = reopened(&writer.file).metadata().unwrap().len();
        assert_eq!(len_after_first, len_after_rollback);

        let mut data = Vec::new();
        let mut readback = reopened(&writer.file);
        readback.seek(SeekFrom::Start(0)).unwrap();
        readback.read_to_end(&mut data).unwrap();
        assert_eq!(data.len(), len_after_first as usize);
    }
}
