//! Command-line surface for the `fsresck` generator binary.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use fsresck_pipeline::{DEFAULT_OPS_TO_TEST, DEFAULT_SECTOR_SIZE};

/// Which of the two `Shuffler` sub-modes drives enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Mode {
    /// Deterministic sliding-window enumerator: exhaustive up to `group_size`.
    #[default]
    Enumerate,
    /// Infinite random sampler, bounded here by `--samples`.
    Sample,
}

/// Replays reordered suffixes of a captured write-log against clones of a base disk image.
#[derive(Debug, Parser)]
#[command(name = "fsresck")]
#[command(about = "Crash-consistency fuzzer driving candidate disk images through an external checker")]
pub struct Cli {
    /// Base disk image every candidate is cloned from.
    pub base_image: PathBuf,

    /// Captured write-log to replay.
    pub log: PathBuf,

    /// Directory temp images are materialized into.
    #[clap(long, env = "FSRESCK_TEMP_DIR", default_value = "/tmp")]
    pub temp_dir: PathBuf,

    /// Width of the WindowSlicer's candidate window.
    #[clap(long, env = "FSRESCK_OPS_TO_TEST", default_value_t = DEFAULT_OPS_TO_TEST)]
    pub ops_to_test: usize,

    /// Fragment size the Fragmenter splits writes into before shuffling.
    #[clap(long, env = "FSRESCK_SECTOR_SIZE", default_value_t = DEFAULT_SECTOR_SIZE)]
    pub sector_size: usize,

    /// Width of the Shuffler's sliding enumeration window (enumerate mode only).
    #[clap(long, env = "FSRESCK_GROUP_SIZE", default_value_t = 3)]
    pub group_size: usize,

    /// Which `Shuffler` sub-mode to drive the candidate windows through.
    #[clap(long, value_enum, env = "FSRESCK_MODE", default_value_t = Mode::Enumerate)]
    pub mode: Mode,

    /// Random permutations to draw per window in `--mode sample` (ignored in `enumerate` mode).
    #[clap(long, env = "FSRESCK_SAMPLES", default_value_t = 100)]
    pub samples: u64,

    /// Seed for the sampler's random source, so a `--mode sample` run can be replayed.
    #[clap(long, env = "FSRESCK_SEED", default_value_t = 0)]
    pub seed: u64,

    /// External consistency-checker executable invoked once per materialized image. A nonzero
    /// exit is reported but does not abort enumeration of further candidates.
    #[clap(long, env = "FSRESCK_CHECKER")]
    pub checker: Option<PathBuf>,
}
