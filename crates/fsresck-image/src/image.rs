//! The `Image` data model: a base image plus a list of writes pending against it.

use std::path::{Path, PathBuf};

use fsresck_log::Write;

/// A base disk image plus the writes that should be applied on top of it, and (once
/// materialized) the path of the temp file that holds the result.
///
/// While `temp_image_name` is set, the temp file on disk already reflects `pending_writes` applied
/// in order; re-materializing is a no-op that returns the existing path.
#[derive(Debug, Clone)]
pub struct Image {
    base_image_name: PathBuf,
    pending_writes: Vec<Write>,
    temp_image_name: Option<PathBuf>,
}

impl Image {
    /// A clean image: no temp file materialized yet.
    pub fn new(base_image_name: impl Into<PathBuf>, pending_writes: Vec<Write>) -> Self {
        Self { base_image_name: base_image_name.into(), pending_writes, temp_image_name: None }
    }

    #[must_use]
    pub fn base_image_name(&self) -> &Path {
        &self.base_image_name
    }

    #[must_use]
    pub fn pending_writes(&self) -> &[Write] {
        &self.pending_writes
    }

    /// The materialized temp file's path, if this image has been rendered.
    #[must_use]
    pub fn temp_image_name(&self) -> Option<&Path> {
        self.temp_image_name.as_deref()
    }

    #[must_use]
    pub fn is_materialized(&self) -> bool {
        self.temp_image_name.is_some()
    }

    pub(crate) fn set_temp_image_name(&mut self, path: PathBuf) {
        self.temp_image_name = Some(path);
    }

    pub(crate) fn clear_temp_image_name(&mut self) {
        self.temp_image_name = None;
    }
}
