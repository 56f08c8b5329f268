//! Enumerates physically-plausible reorderings of a window of writes.
//!
//! Two complementary modes are provided: [`Shuffler::shuffle`], an infinite random sampler for
//! fuzzing runs with no fixed budget, and [`Shuffler::generate`], a deterministic sliding-window
//! enumerator that exhaustively covers small windows.

use std::collections::{HashSet, VecDeque};
use std::path::{Path, PathBuf};

use fsresck_image::Image;
use fsresck_log::{overlapping, Write};
use rand::seq::SliceRandom;
use rand::Rng;
use tracing::trace;

use crate::error::{Error, Result};

fn validate_base(base_image_name: &Path) -> Result<()> {
    if base_image_name.as_os_str().is_empty() {
        return Err(Error::BadArgument("base image path must not be empty".into()));
    }
    Ok(())
}

/// Enumerates reorderings of a finite window of writes against a shared base image.
#[derive(Debug, Default, Clone, Copy)]
pub struct Shuffler;

impl Shuffler {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// An infinite sampler of random total reorderings of `writes`, each paired with a fresh
    /// `Image` that carries no prefix of its own (the shuffled order stands in for one).
    ///
    /// Rejects any sampled permutation whose first element equals `writes[0]`, since that ordering
    /// is indistinguishable from applying nothing at all on top of the base image; this rejection
    /// is skipped when `writes` has fewer than two elements, since no other ordering exists.
    ///
    /// The random source is caller-injected so tests (and reproducible fuzzing runs) can pin it.
    pub fn shuffle<R: Rng>(
        &self,
        base_image_name: impl Into<PathBuf>,
        writes: Vec<Write>,
        rng: R,
    ) -> Result<ShuffleSampler<R>> {
        let base_image_name = base_image_name.into();
        validate_base(&base_image_name)?;
        Ok(ShuffleSampler { base_image_name, writes, rng })
    }

    /// A deterministic enumerator over `writes`, sliding a window of `group_size` writes and
    /// emitting every combinatorially-distinct candidate suffix per window position.
    ///
    /// `prefix` seeds the generator's committed prefix (normally `image.pending_writes()`); the
    /// base image name to stamp onto emitted images is taken from `image`.
    pub fn generate(
        &self,
        image: &Image,
        writes: &[Write],
        group_size: usize,
    ) -> Result<ShuffleGenerator> {
        validate_base(image.base_image_name())?;
        if group_size == 0 {
            return Err(Error::BadArgument("group_size must be at least 1".into()));
        }
        Ok(ShuffleGenerator::new(
            image.base_image_name().to_path_buf(),
            image.pending_writes().to_vec(),
            writes,
            group_size,
        ))
    }
}

/// Infinite iterator yielding `(Image, permuted_writes)` pairs. See [`Shuffler::shuffle`].
#[derive(Debug)]
pub struct ShuffleSampler<R> {
    base_image_name: PathBuf,
    writes: Vec<Write>,
    rng: R,
}

impl<R: Rng> Iterator for ShuffleSampler<R> {
    type Item = (Image, Vec<Write>);

    fn next(&mut self) -> Option<Self::Item> {
        if self.writes.is_empty() {
            return Some((Image::new(self.base_image_name.clone(), Vec::new()), Vec::new()));
        }

        loop {
            let mut permuted = self.writes.clone();
            permuted.shuffle(&mut self.rng);
            if self.writes.len() > 1 && permuted[0] == self.writes[0] {
                continue;
            }
            return Some((Image::new(self.base_image_name.clone(), Vec::new()), permuted));
        }
    }
}

#[derive(Debug)]
enum GenState {
    EmitBase,
    Enumerate { selections: Vec<Vec<usize>>, idx: usize },
    Done,
}

/// Finite iterator yielding `(Image, candidate_suffix)` pairs. See [`Shuffler::generate`].
#[derive(Debug)]
pub struct ShuffleGenerator {
    base_image_name: PathBuf,
    prefix: Vec<Write>,
    window: VecDeque<Write>,
    remaining: VecDeque<Write>,
    ordered_seen: HashSet<Vec<usize>>,
    unordered_seen: HashSet<Vec<usize>>,
    state: GenState,
}

impl ShuffleGenerator {
    fn new(base_image_name: PathBuf, prefix: Vec<Write>, writes: &[Write], group_size: usize) -> Self {
        let mut remaining: VecDeque<Write> = writes.iter().cloned().collect();
        let mut window = VecDeque::new();
        for _ in 0..group_size {
            match remaining.pop_front() {
                Some(w) => window.push_back(w),
                None => break,
            }
        }
        Self {
            base_image_name,
            prefix,
            window,
            remaining,
            ordered_seen: HashSet::new(),
            unordered_seen: HashSet::new(),
            state: GenState::EmitBase,
        }
    }

    fn base_pair(&self) -> (Image, Vec<Write>) {
        (Image::new(self.base_image_name.clone(), self.prefix.clone()), Vec::new())
    }

    fn suffix_pair(&self, selection: &[usize]) -> (Image, Vec<Write>) {
        let writes = selection.iter().map(|&i| self.window[i].clone()).collect();
        (Image::new(self.base_image_name.clone(), self.prefix.clone()), writes)
    }

    fn advance_window(&mut self) {
        if let Some(oldest) = self.window.pop_front() {
            self.prefix.push(oldest);
        }
        if let Some(next) = self.remaining.pop_front() {
            self.window.push_back(next);
        }
        self.ordered_seen.clear();
        self.unordered_seen.clear();
    }
}

impl Iterator for ShuffleGenerator {
    type Item = (Image, Vec<Write>);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match &mut self.state {
                GenState::Done => return None,

                GenState::EmitBase => {
                    let pair = self.base_pair();
                    self.state = if self.window.is_empty() {
                        GenState::Done
                    } else {
                        let selections = all_ordered_selections(self.window.len());
                        GenState::Enumerate { selections, idx: 0 }
                    };
                    return Some(pair);
                }

                GenState::Enumerate { selections, idx } => {
                    while *idx < selections.len() {
                        let selection = selections[*idx].clone();
                        *idx += 1;

                        if self.ordered_seen.contains(&selection) || selection[0] == 0 {
                            continue;
                        }

                        let candidate: Vec<Write> =
                            selection.iter().map(|&i| self.window[i].clone()).collect();

                        if overlapping(&candidate) {
                            self.ordered_seen.insert(selection.clone());
                            trace!(len = selection.len(), "emitting overlap-ordered suffix");
                            return Some(self.suffix_pair(&selection));
                        }

                        let mut canonical = selection.clone();
                        canonical.sort_unstable();
                        let in_order_prefix: Vec<usize> = (0..selection.len()).collect();
                        if self.unordered_seen.contains(&canonical)
                            || canonical == in_order_prefix
                            || canonical.contains(&0)
                        {
                            continue;
                        }

                        self.ordered_seen.insert(selection.clone());
                        self.unordered_seen.insert(canonical);
                        trace!(len = selection.len(), "emitting non-overlapping suffix");
                        return Some(self.suffix_pair(&selection));
                    }

                    self.advance_window();
                    self.state = GenState::EmitBase;
                }
            }
        }
    }
}

/// Every non-empty ordered selection (permutation of every non-empty subset) of `0..n`.
fn all_ordered_selections(n: usize) -> Vec<Vec<usize>> {
    let indices: Vec<usize> = (0..n).collect();
    let mut out = Vec::new();
    for k in 1..=n {
        let mut used = vec![false; n];
        let mut current = Vec::with_capacity(k);
        permutations_of_size(&indices, k, &mut current, &mut used, &mut out);
    }
    out
}

fn permutations_of_size(
    indices: &[usize],
    k: usize,
    current: &mut Vec<usize>,
    used: &mut [bool],
    out: &mut Vec<Vec<usize>>,
) {
    if current.len() == k {
        out.push(current.clone());
        return;
    }
    for &i in indices {
        if used[i] {
            continue;
        }
        used[i] = true;
        current.push(i);
        permutations_of_size(indices, k, current, used, out);
        current.pop();
        used[i] = false;
    }
}
