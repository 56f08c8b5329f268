//! Lazy pipeline stages that turn a write-log into the candidate reorderings a crash-consistency
//! checker should be run against: windowing, fragmentation, and reorder enumeration.

pub mod error;
mod fragmenter;
mod shuffler;
mod window_slicer;

pub use error::{Error, Result};
pub use fragmenter::{FragmentExt, Fragmenter, DEFAULT_SECTOR_SIZE};
pub use shuffler::{ShuffleGenerator, ShuffleSampler, Shuffler};
pub use window_slicer::{WindowSlicer, DEFAULT_OPS_TO_TEST};
