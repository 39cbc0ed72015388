//! Worker pool for the data-parallel passes.
//!
//! Physics integration and per-particle precompute are independent per
//! element. Both run on a dedicated rayon pool with static, even
//! partitioning: the slice is cut into one contiguous chunk per worker.
//! A pool of size 1 is the sequential build.

use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::error::SceneError;

/// Fixed-size pool running fork/join passes over particle slices.
pub struct Workers {
    pool: ThreadPool,
}

impl Workers {
    /// Start a pool with `threads` workers; `0` means one per logical CPU.
    pub fn new(threads: usize) -> Result<Self, SceneError> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("mandala-worker-{}", i))
            .build()?;
        Ok(Self { pool })
    }

    /// Number of worker threads.
    pub fn threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Chunk length giving every worker one contiguous block.
    fn chunk_len(&self, len: usize) -> usize {
        len.div_ceil(self.threads().max(1)).max(1)
    }

    /// Apply `f` to every element. Returns once all elements are done.
    pub fn for_each_mut<T, F>(&self, items: &mut [T], f: F)
    where
        T: Send,
        F: Fn(&mut T) + Sync,
    {
        let chunk = self.chunk_len(items.len());
        self.pool.install(|| {
            items.par_chunks_mut(chunk).for_each(|block| {
                for item in block {
                    f(item);
                }
            });
        });
    }

    /// Fill `out[i] = f(i, &input[i])` for every index.
    ///
    /// `out` and `input` must have the same length.
    pub fn map_into<T, U, F>(&self, input: &[T], out: &mut [U], f: F)
    where
        T: Sync,
        U: Send,
        F: Fn(usize, &T) -> U + Sync,
    {
        debug_assert_eq!(input.len(), out.len());
        let chunk = self.chunk_len(input.len());
        self.pool.install(|| {
            out.par_chunks_mut(chunk)
                .zip(input.par_chunks(chunk))
                .enumerate()
                .for_each(|(block, (dst, src))| {
                    let base = block * chunk;
                    for (j, (slot, item)) in dst.iter_mut().zip(src).enumerate() {
                        *slot = f(base + j, item);
                    }
                });
        });
    }
}

impl std::fmt::Debug for Workers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Workers").field("threads", &self.threads()).finish()
    }
}
