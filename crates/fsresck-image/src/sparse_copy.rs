//! Sparse-preserving fallback copy used when the destination filesystem cannot reflink.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom, Write};

use crate::error::Result;

const CHUNK: usize = 64 * 1024;

/// Copy `src` to `dest` chunk by chunk, skipping (rather than writing) any chunk that is entirely
/// zero, so holes in `src` remain holes in `dest` instead of becoming allocated zero blocks.
///
/// `dest` must already be open for writing and positioned at offset zero, empty.
pub(crate) fn copy_sparse(src: &mut File, dest: &mut File) -> Result<()> {
    let total_len = src.metadata()?.len();
    src.seek(SeekFrom::Start(0))?;

    let mut buf = vec![0u8; CHUNK];
    let mut pos: u64 = 0;
    loop {
        let read = read_fully(src, &mut buf)?;
        if read == 0 {
            break;
        }
        if buf[..read].iter().any(|&b| b != 0) {
            dest.seek(SeekFrom::Start(pos))?;
            dest.write_all(&buf[..read])?;
        }
        pos += read as u64;
    }

    dest.set_len(total_len)?;
    Ok(())
}

fn read_fully(src: &mut File, buf: &mut [u8]) -> Result<usize> {
    let mut read = 0;
    while read < buf.len() {
        match src.read(&mut buf[read..])? {
            0 => break,
            n => read += n,
        }
    }
    Ok(read)
}
