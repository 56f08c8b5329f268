//! Capture-side integration: a block-device plugin that logs every write issued against a backing
//! disk before acknowledging the host that issued it.

pub mod config;
mod disk;
pub mod error;
mod plugin;

pub use config::Config;
pub use disk::BackingDisk;
pub use error::{Error, Result};
pub use plugin::{CapturePlugin, Handle};
