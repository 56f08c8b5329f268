//! Turns a flat write-log stream into `(Image, candidate_writes)` windows.

use std::collections::VecDeque;
use std::io::Read;
use std::path::PathBuf;

use fsresck_image::Image;
use fsresck_log::{LogReader, Write};

use crate::error::Result;

/// Default window width when the caller does not override it.
pub const DEFAULT_OPS_TO_TEST: usize = 5;

/// Lazily emits `(Image, candidate_writes)` pairs: an in-order prefix of already-applied writes
/// paired with a bounded window of writes that follow it.
///
/// Memory use is bounded by `ops_to_test + |prefix|`; each emitted pair is an independent snapshot,
/// so advancing the slicer further never mutates a pair already handed to the caller.
#[derive(Debug)]
pub struct WindowSlicer<R> {
    upstream: LogReader<R>,
    base_image_name: PathBuf,
    ops_to_test: usize,
    prefix: Vec<Write>,
    candidate: VecDeque<Write>,
    primed: bool,
    upstream_exhausted: bool,
}

impl<R: Read> WindowSlicer<R> {
    /// `base_image_name` is stamped onto every emitted [`Image`]; `ops_to_test` bounds the
    /// candidate window width (see [`DEFAULT_OPS_TO_TEST`]).
    pub fn new(upstream: LogReader<R>, base_image_name: impl Into<PathBuf>, ops_to_test: usize) -> Self {
        Self {
            upstream,
            base_image_name: base_image_name.into(),
            ops_to_test,
            prefix: Vec::new(),
            candidate: VecDeque::new(),
            primed: false,
            upstream_exhausted: false,
        }
    }

    fn snapshot(&self) -> (Image, Vec<Write>) {
        let image = Image::new(self.base_image_name.clone(), self.prefix.clone());
        let candidate = self.candidate.iter().cloned().collect();
        (image, candidate)
    }

    fn prime(&mut self) -> Result<()> {
        self.primed = true;
        for _ in 0..self.ops_to_test {
            match self.upstream.next() {
                Some(Ok(write)) => self.candidate.push_back(write),
                Some(Err(e)) => return Err(e.into()),
                None => {
                    self.upstream_exhausted = true;
                    break;
                }
            }
        }
        Ok(())
    }
}

impl<R: Read> Iterator for WindowSlicer<R> {
    type Item = Result<(Image, Vec<Write>)>;

    fn next(&mut self) -> Option<Self::Item> {
        if !self.primed {
            if let Err(e) = self.prime() {
                return Some(Err(e));
            }
            return Some(Ok(self.snapshot()));
        }

        if !self.upstream_exhausted {
            match self.upstream.next() {
                Some(Ok(write)) => {
                    if let Some(oldest) = self.candidate.pop_front() {
                        self.prefix.push(oldest);
                    }
                    self.candidate.push_back(write);
                    return Some(Ok(self.snapshot()));
                }
                Some(Err(e)) => {
                    self.upstream_exhausted = true;
                    return Some(Err(e.into()));
                }
                None => self.upstream_exhausted = true,
            }
        }

        let oldest = self.candidate.pop_front()?;
        self.prefix.push(oldest);
        Some(Ok(self.snapshot()))
    }
}
