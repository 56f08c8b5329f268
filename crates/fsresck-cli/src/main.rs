//! Entry point for the `fsresck` generator binary: streams a captured write-log through the
//! window/fragment/shuffle pipeline, materializing a candidate disk image for every emitted
//! `(prefix, suffix)` pair and handing it to an external consistency checker.

mod cli;
mod error;

use std::fs::File;
use std::process::{Command, ExitCode};

use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use cli::{Cli, Mode};
use error::Result;
use fsresck_image::{Image, ImageMaterializer};
use fsresck_log::{LogReader, Write as LoggedWrite};
use fsresck_pipeline::{FragmentExt, Shuffler, WindowSlicer};

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    match run(&cli) {
        Ok(stats) => {
            info!(
                materialized = stats.materialized,
                checker_failures = stats.checker_failures,
                "enumeration complete"
            );
            if stats.checker_failures > 0 {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            }
        }
        Err(e) => {
            error!(error = %e, "fsresck run aborted");
            ExitCode::FAILURE
        }
    }
}

/// Running totals surfaced once the whole log has been enumerated.
#[derive(Debug, Default)]
struct Stats {
    materialized: u64,
    checker_failures: u64,
}

fn run(cli: &Cli) -> Result<Stats> {
    std::fs::create_dir_all(&cli.temp_dir)?;

    let log_file = File::open(&cli.log)?;
    let reader = LogReader::new(log_file, None);
    let slicer = WindowSlicer::new(reader, cli.base_image.clone(), cli.ops_to_test);

    let shuffler = Shuffler::new();
    let materializer = ImageMaterializer::new();
    let mut stats = Stats::default();

    for (window_index, window) in slicer.enumerate() {
        let (image, candidates) = window?;
        let fragments: Vec<LoggedWrite> =
            candidates.into_iter().fragment(cli.sector_size).collect();

        match cli.mode {
            Mode::Enumerate => {
                for (prefix_image, suffix) in shuffler.generate(&image, &fragments, cli.group_size)? {
                    materialize_and_check(cli, &materializer, prefix_image, suffix, &mut stats);
                }
            }
            Mode::Sample => {
                run_sample_window(cli, &shuffler, &materializer, &image, fragments, window_index, &mut stats)?;
            }
        }
    }

    Ok(stats)
}

/// Commits the window's prefix to a real temp file once, then draws `cli.samples` random total
/// reorderings of the window's (fragmented) writes on top of it.
///
/// A fresh, deterministic-but-window-distinct RNG is derived from `cli.seed` so a `--mode sample`
/// run can be replayed exactly, without needing the sampler to survive across windows.
fn run_sample_window(
    cli: &Cli,
    shuffler: &Shuffler,
    materializer: &ImageMaterializer,
    image: &Image,
    fragments: Vec<LoggedWrite>,
    window_index: usize,
    stats: &mut Stats,
) -> Result<()> {
    let mut prefix_image = Image::new(image.base_image_name().to_path_buf(), image.pending_writes().to_vec());
    let prefix_path = match materializer.create_image(&mut prefix_image, &cli.temp_dir) {
        Ok(path) => path.to_path_buf(),
        Err(e) => {
            warn!(error = %e, "failed to materialize window prefix, skipping window");
            return Ok(());
        }
    };

    if !fragments.is_empty() {
        let seed = cli.seed ^ (window_index as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15);
        let rng = StdRng::seed_from_u64(seed);
        let sampler = shuffler.shuffle(prefix_path.clone(), fragments, rng)?;

        for (sample_base, permuted) in sampler.take(cli.samples as usize) {
            let candidate = Image::new(sample_base.base_image_name().to_path_buf(), permuted);
            materialize_and_check(cli, materializer, candidate, Vec::new(), stats);
        }
    }

    if let Err(e) = materializer.cleanup(&mut prefix_image) {
        warn!(error = %e, image = %prefix_path.display(), "failed to clean up window-prefix temp image");
    }

    Ok(())
}

/// Renders one `(prefix, suffix)` pair to a temp file and, if configured, hands it to the
/// external checker. A failure here is reported and skipped; it never aborts enumeration of the
/// rest of the log.
fn materialize_and_check(
    cli: &Cli,
    materializer: &ImageMaterializer,
    prefix_image: Image,
    suffix: Vec<LoggedWrite>,
    stats: &mut Stats,
) {
    let mut writes = prefix_image.pending_writes().to_vec();
    writes.extend(suffix);
    let mut candidate = Image::new(prefix_image.base_image_name().to_path_buf(), writes);

    let temp_path = match materializer.create_image(&mut candidate, &cli.temp_dir) {
        Ok(path) => path.to_path_buf(),
        Err(e) => {
            warn!(error = %e, "materialization failed for a candidate image, skipping");
            return;
        }
    };
    stats.materialized += 1;

    match &cli.checker {
        Some(checker) => run_checker(checker, &temp_path, stats),
        None => info!(image = %temp_path.display(), "materialized candidate image (no checker configured)"),
    }

    if let Err(e) = materializer.cleanup(&mut candidate) {
        warn!(error = %e, image = %temp_path.display(), "failed to clean up temp image");
    }
}

fn run_checker(checker: &std::path::Path, image: &std::path::Path, stats: &mut Stats) {
    match Command::new(checker).arg(image).status() {
        Ok(status) if status.success() => {
            info!(image = %image.display(), "checker passed");
        }
        Ok(status) => {
            stats.checker_failures += 1;
            error!(image = %image.display(), %status, "checker reported a crash-consistency failure");
        }
        Err(e) => {
            warn!(error = %e, checker = %checker.display(), "failed to invoke external checker");
        }
    }
}
