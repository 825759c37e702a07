//! Execution spaces for data-parallel kernels.
//!
//! A kernel is written once against [`ExecSpace`] and run either across the
//! whole host ([`Device`]) or confined to one worker of an outer parallel loop
//! ([`Team`]). The space is a scheduling parameter only; both produce the
//! same results for the same inputs.

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Vectors shorter than this run sequentially even on [`Device`].
pub const PAR_THRESHOLD: usize = 4096;

/// Chunk length for device reductions.
///
/// Partial sums are formed per fixed-size chunk and combined in chunk order,
/// so a reduction gives the same bits no matter how rayon schedules it.
pub const REDUCE_CHUNK: usize = 1024;

/// A scheduling context for reductions and elementwise maps.
pub trait ExecSpace: Send + Sync {
    /// Short name for logging.
    fn name(&self) -> &'static str;

    /// `sum(f(i) for i in 0..len)`.
    fn reduce_sum<F>(&self, len: usize, f: F) -> f64
    where
        F: Fn(usize) -> f64 + Send + Sync;

    /// Call `f(i, &mut out[i])` for every index.
    fn for_each_mut<T, F>(&self, out: &mut [T], f: F)
    where
        T: Send,
        F: Fn(usize, &mut T) + Send + Sync;
}

/// Whole-host execution.
///
/// With the `parallel` feature, vectors of at least [`PAR_THRESHOLD`] elements
/// are processed on the rayon global pool.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Device;

/// Execution confined to one member of a league of teams.
///
/// Used when many small, independent kernels are themselves spread across an
/// outer parallel loop: each team runs its kernels in index order on its own
/// worker and never touches another team's data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Team {
    league_rank: usize,
    league_size: usize,
}

impl Team {
    /// Team `league_rank` out of `league_size`.
    ///
    /// # Panics
    /// Panics if `league_rank >= league_size`.
    pub fn new(league_rank: usize, league_size: usize) -> Self {
        assert!(
            league_rank < league_size,
            "team rank {league_rank} out of range for league of {league_size}"
        );
        Self {
            league_rank,
            league_size,
        }
    }

    pub fn league_rank(&self) -> usize {
        self.league_rank
    }

    pub fn league_size(&self) -> usize {
        self.league_size
    }
}

fn sequential_sum<F: Fn(usize) -> f64>(start: usize, end: usize, f: &F) -> f64 {
    (start..end).map(f).sum()
}

impl ExecSpace for Device {
    fn name(&self) -> &'static str {
        "device"
    }

    fn reduce_sum<F>(&self, len: usize, f: F) -> f64
    where
        F: Fn(usize) -> f64 + Send + Sync,
    {
        #[cfg(feature = "parallel")]
        if len >= PAR_THRESHOLD {
            let chunks = len.div_ceil(REDUCE_CHUNK);
            let partials: Vec<f64> = (0..chunks)
                .into_par_iter()
                .map(|c| {
                    let start = c * REDUCE_CHUNK;
                    sequential_sum(start, (start + REDUCE_CHUNK).min(len), &f)
                })
                .collect();
            return partials.into_iter().sum();
        }

        let mut total = 0.0;
        let mut start = 0;
        while start < len {
            let end = (start + REDUCE_CHUNK).min(len);
            total += sequential_sum(start, end, &f);
            start = end;
        }
        total
    }

    fn for_each_mut<T, F>(&self, out: &mut [T], f: F)
    where
        T: Send,
        F: Fn(usize, &mut T) + Send + Sync,
    {
        #[cfg(feature = "parallel")]
        if out.len() >= PAR_THRESHOLD {
            out.par_iter_mut().enumerate().for_each(|(i, y)| f(i, y));
            return;
        }

        out.iter_mut().enumerate().for_each(|(i, y)| f(i, y));
    }
}

impl ExecSpace for Team {
    fn name(&self) -> &'static str {
        "team"
    }

    fn reduce_sum<F>(&self, len: usize, f: F) -> f64
    where
        F: Fn(usize) -> f64 + Send + Sync,
    {
        // Same chunked order as Device so both spaces agree bitwise.
        let mut total = 0.0;
        let mut start = 0;
        while start < len {
            let end = (start + REDUCE_CHUNK).min(len);
            total += sequential_sum(start, end, &f);
            start = end;
        }
        total
    }

    fn for_each_mut<T, F>(&self, out: &mut [T], f: F)
    where
        T: Send,
        F: Fn(usize, &mut T) + Send + Sync,
    {
        out.iter_mut().enumerate().for_each(|(i, y)| f(i, y));
    }
}
