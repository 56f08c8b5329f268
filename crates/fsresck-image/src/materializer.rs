//! Produces a temp file that is a CoW clone of an [`Image`]'s base image with its pending writes
//! applied, idempotently.

use std::fs::{self, File, OpenOptions};
use std::io::{Seek, SeekFrom, Write as IoWrite};
use std::path::Path;

use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::image::Image;
use crate::sparse_copy::copy_sparse;

/// Materializes [`Image`]s into real temp files, cloning the base image via reflink where the
/// filesystem supports it and falling back to a sparse-preserving copy otherwise.
#[derive(Debug, Default, Clone, Copy)]
pub struct ImageMaterializer;

impl ImageMaterializer {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Render `image`'s base image plus its pending writes into a temp file under `dir`, returning
    /// that path. A no-op if `image` is already materialized.
    pub fn create_image<'a>(&self, image: &'a mut Image, dir: &Path) -> Result<&'a Path> {
        if image.temp_image_name().is_none() {
            let temp_path = self.clone_base_image(image.base_image_name(), dir)?;
            self.apply_pending_writes(&temp_path, image)?;
            image.set_temp_image_name(temp_path);
        }
        Ok(image.temp_image_name().expect("just set"))
    }

    fn clone_base_image(&self, base: &Path, dir: &Path) -> Result<std::path::PathBuf> {
        // Reserve a unique name via `tempfile`, then remove the placeholder file it created:
        // `reflink_copy::reflink` creates its own destination and errors if one is already there,
        // so the file must be gone again before we call it.
        let named = tempfile::Builder::new()
            .prefix("fsresck-image-")
            .tempfile_in(dir)
            .map_err(Error::Io)?;
        let temp_path = named.into_temp_path();
        fs::remove_file(&temp_path).map_err(Error::Io)?;
        let temp_path = temp_path.keep().map_err(|e| Error::Io(e.error))?;

        match reflink_copy::reflink(base, &temp_path) {
            Ok(()) => {
                debug!(base = %base.display(), dest = %temp_path.display(), "reflinked base image");
            }
            Err(reflink_err) => {
                warn!(error = %reflink_err, "reflink unavailable, falling back to sparse copy");
                let mut src = File::open(base).map_err(|source| Error::FSCopy {
                    base: base.to_path_buf(),
                    dest: temp_path.clone(),
                    source,
                })?;
                let mut dest = OpenOptions::new()
                    .write(true)
                    .create(true)
                    .open(&temp_path)
                    .map_err(|source| {
                        Error::FSCopy { base: base.to_path_buf(), dest: temp_path.clone(), source }
                    })?;
                copy_sparse(&mut src, &mut dest).map_err(|e| match e {
                    Error::Io(source) => {
                        Error::FSCopy { base: base.to_path_buf(), dest: temp_path.clone(), source }
                    }
                    other => other,
                })?;
            }
        }

        Ok(temp_path)
    }

    fn apply_pending_writes(&self, temp_path: &Path, image: &Image) -> Result<()> {
        let mut file = OpenOptions::new().read(true).write(true).open(temp_path)?;
        for write in image.pending_writes() {
            file.seek(SeekFrom::Start(write.offset))?;
            file.write_all(&write.data)?;
        }
        file.flush()?;
        Ok(())
    }

    /// Unlink the materialized temp file, if any, and clear `image`'s temp state.
    pub fn cleanup(&self, image: &mut Image) -> Result<()> {
        if let Some(path) = image.temp_image_name() {
            fs::remove_file(path)?;
        }
        image.clear_temp_image_name();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use tempfile::tempdir;

    fn write_base(dir: &Path, contents: &[u8]) -> std::path::PathBuf {
        let path = dir.join("base.img");
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn materializes_base_plus_pending_writes() {
        let dir = tempdir().unwrap();
        let base = write_base(dir.path(), &[0u8; 4096]);

        let writes = vec![fsresck_log::Write::new(0, vec![1, 2, 3, 4])];
        let mut image = Image::new(&base, writes);

        let materializer = ImageMaterializer::new();
        let temp_path = materializer.create_image(&mut image, dir.path()).unwrap().to_path_buf();

        let mut contents = Vec::new();
        File::open(&temp_path).unwrap().read_to_end(&mut contents).unwrap();
        assert_eq!(&contents[..4], &[1, 2, 3, 4]);
        assert_eq!(contents.len(), 4096);

        materializer.cleanup(&mut image).unwrap();
        assert!(!temp_path.exists());
        assert!(!image.is_materialized());
    }

    #[test]
    fn create_image_is_idempotent() {
        let dir = tempdir().unwrap();
        let base = write_base(dir.path(), &[0u8; 512]);
        let mut image = Image::new(&base, vec![]);

        let materializer = ImageMaterializer::new();
        let first = materializer.create_image(&mut image, dir.path()).unwrap().to_path_buf();
        let second = materializer.create_image(&mut image, dir.path()).unwrap().to_path_buf();
        assert_eq!(first, second);

        materializer.cleanup(&mut image).unwrap();
    }
}
