//! Copy-on-write materialization of candidate disk images.
//!
//! An [`Image`] pairs a base image with the writes pending against it; an [`ImageMaterializer`]
//! turns that pair into a real temp file, cloning the base via reflink where possible.

pub mod error;
mod image;
mod materializer;
mod sparse_copy;

pub use error::{Error, Result};
pub use image::Image;
pub use materializer::ImageMaterializer;
