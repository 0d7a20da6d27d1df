//! Parallel processing utilities for array operations
//!
//! Rows are split into chunks that each own an RNG seeded from the base
//! seed plus the chunk index, so results do not depend on thread scheduling.

use ndarray::{Array2, ArrayViewMut2, Axis};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;

/// Default number of rows handed to each worker
pub const DEFAULT_CHUNK_ROWS: usize = 64;

/// Process an Array2 in parallel row chunks with deterministic seeding
///
/// # Arguments
/// * `array` - The 2D array to process
/// * `seed` - Base seed for random number generation
/// * `chunk_size` - Rows per chunk, [`DEFAULT_CHUNK_ROWS`] if None
/// * `processor` - Closure that processes each chunk with its own RNG; it
///   receives the index of the chunk's first row
pub fn process_array_in_parallel_chunks<F>(
    mut array: Array2<f64>,
    seed: u64,
    chunk_size: Option<usize>,
    processor: F,
) -> Array2<f64>
where
    F: Fn(usize, &mut ArrayViewMut2<f64>, &mut StdRng) + Send + Sync,
{
    let chunk_size = chunk_size.unwrap_or(DEFAULT_CHUNK_ROWS).max(1);

    array
        .axis_chunks_iter_mut(Axis(0), chunk_size)
        .into_par_iter()
        .enumerate()
        .for_each(|(chunk_idx, mut chunk)| {
            let chunk_seed = seed.wrapping_add(chunk_idx as u64);
            let mut rng = StdRng::seed_from_u64(chunk_seed);
            processor(chunk_idx * chunk_size, &mut chunk, &mut rng);
        });

    array
}
