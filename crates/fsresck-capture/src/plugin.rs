//! The capture plugin: intercepts every write the host issues against the backing disk and
//! persists it to the write-log before acknowledging the host.

use std::fs::OpenOptions;
use std::io::{Seek, SeekFrom};
use std::time::{SystemTime, UNIX_EPOCH};

use fsresck_log::LogWriter;
use tracing::{debug, info};

use crate::config::Config;
use crate::disk::BackingDisk;
use crate::error::{Error, Result};

fn now_nanos() -> f64 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_nanos() as f64
}

/// An open handle onto the backing disk and its write-log, as returned by [`CapturePlugin::open`].
#[derive(Debug)]
pub struct Handle<D> {
    disk: D,
    log: LogWriter,
    readonly: bool,
}

impl<D: BackingDisk> Handle<D> {
    pub fn get_size(&mut self) -> Result<u64> {
        Ok(self.disk.len()?)
    }

    pub fn pread(&mut self, count: usize, offset: u64) -> Result<Vec<u8>> {
        Ok(self.disk.read_at(offset, count)?)
    }

    /// Seeks the backing disk to `offset`, writes `buf`, and appends a LogRecord capturing the
    /// timestamps bracketing the write.
    pub fn pwrite(&mut self, buf: &[u8], offset: u64) -> Result<()> {
        if self.readonly {
            return Err(Error::BadArgument("pwrite on a read-only handle".into()));
        }
        let start_time = now_nanos();
        self.disk.write_at(offset, buf)?;
        let end_time = now_nanos();
        self.log.append_write(offset, buf, start_time, end_time)?;
        debug!(offset, length = buf.len(), "captured write");
        Ok(())
    }

    /// Writes `count` zero bytes at `offset`, logging the same way as [`Handle::pwrite`]. Fails
    /// with `Unsupported` unless `may_trim` is set, since the plugin never discards a region of
    /// the disk without first logging what replaced it.
    pub fn zero(&mut self, count: usize, offset: u64, may_trim: bool) -> Result<()> {
        if !may_trim {
            return Err(Error::Unsupported("zero without may_trim".into()));
        }
        let zeros = vec![0u8; count];
        self.pwrite(&zeros, offset)
    }
}

/// Intercepts writes issued by a block-device server host against a single backing disk,
/// persisting every one to the configured write-log.
#[derive(Debug, Clone)]
pub struct CapturePlugin {
    config: Config,
}

impl CapturePlugin {
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Open the backing disk and the write-log, returning an opaque handle the host drives
    /// `pread`/`pwrite`/`zero`/`get_size` through.
    pub fn open(&self, readonly: bool) -> Result<Handle<std::fs::File>> {
        let disk = OpenOptions::new().read(true).write(!readonly).open(&self.config.disk)?;

        let mut log_file =
            OpenOptions::new().create(true).read(true).write(true).open(&self.config.log)?;
        log_file.seek(SeekFrom::End(0))?;

        info!(disk = %self.config.disk.display(), log = %self.config.log.display(), readonly, "opened capture handle");
        Ok(Handle { disk, log: LogWriter::new(log_file), readonly })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::io::Read;
    use tempfile::tempdir;

    fn setup(dir: &std::path::Path, disk_size: usize) -> CapturePlugin {
        let disk_path = dir.join("disk.img");
        let log_path = dir.join("writes.log");
        fs::write(&disk_path, vec![0u8; disk_size]).unwrap();
        let config = Config { disk: disk_path, log: log_path };
        CapturePlugin::new(config)
    }

    #[test]
    fn pwrite_updates_the_disk_and_appends_a_log_record() {
        let dir = tempdir().unwrap();
        let plugin = setup(dir.path(), 4096);
        let mut handle = plugin.open(false).unwrap();

        handle.pwrite(b"hello", 100).unwrap();

        let read_back = handle.pread(5, 100).unwrap();
        assert_eq!(read_back, b"hello");

        let mut log_bytes = Vec::new();
        fs::File::open(dir.path().join("writes.log")).unwrap().read_to_end(&mut log_bytes).unwrap();
        let writes: Vec<_> =
            fsresck_log::LogReader::new(&log_bytes[..], None).collect::<fsresck_log::Result<_>>().unwrap();
        assert_eq!(writes.len(), 1);
        assert_eq!(writes[0].offset, 100);
        assert_eq!(writes[0].data, b"hello");
    }

    #[test]
    fn zero_without_may_trim_is_rejected() {
        let dir = tempdir().unwrap();
        let plugin = setup(dir.path(), 4096);
        let mut handle = plugin.open(false).unwrap();
        assert!(matches!(handle.zero(512, 0, false), Err(Error::Unsupported(_))));
    }

    #[test]
    fn zero_with_may_trim_writes_zero_bytes_and_logs_them() {
        let dir = tempdir().unwrap();
        let plugin = setup(dir.path(), 4096);
        let mut handle = plugin.open(false).unwrap();
        handle.pwrite(&[0xffu8; 512], 0).unwrap();
        handle.zero(512, 0, true).unwrap();
        assert_eq!(handle.pread(512, 0).unwrap(), vec![0u8; 512]);
    }

    #[test]
    fn readonly_handle_rejects_writes() {
        let dir = tempdir().unwrap();
        let plugin = setup(dir.path(), 4096);
        let mut handle = plugin.open(true).unwrap();
        assert!(handle.pwrite(b"x", 0).is_err());
    }
}
