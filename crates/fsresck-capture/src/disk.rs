//! The backing-disk side of the capture plugin, kept behind a trait so tests can swap in an
//! in-memory disk without touching real files.

use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom, Write};

/// Random-access reads and writes against a backing disk, plus its current size.
pub trait BackingDisk {
    fn len(&mut self) -> io::Result<u64>;
    fn read_at(&mut self, offset: u64, count: usize) -> io::Result<Vec<u8>>;
    fn write_at(&mut self, offset: u64, data: &[u8]) -> io::Result<()>;
}

impl BackingDisk for File {
    fn len(&mut self) -> io::Result<u64> {
        self.metadata().map(|m| m.len())
    }

    fn read_at(&mut self, offset: u64, count: usize) -> io::Result<Vec<u8>> {
        self.seek(SeekFrom::Start(offset))?;
        let mut buf = vec![0u8; count];
        self.read_exact(&mut buf)?;
        Ok(buf)
    }

    fn write_at(&mut self, offset: u64, data: &[u8]) -> io::Result<()> {
        self.seek(SeekFrom::Start(offset))?;
        self.write_all(data)
    }
}
