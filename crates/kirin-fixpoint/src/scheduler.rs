use rayon::ThreadPool;
use rayon::prelude::*;

use crate::error::FixpointError;

/// How the inputs of one batch are split into work items.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SchedulerPolicy {
    /// Chunks of exactly `n` inputs (the last one may be shorter).
    FixedChunkSize(usize),
    /// Aim for `preferred_chunks_per_worker` chunks per worker, but never
    /// below `minimum_chunk_size` inputs per chunk.
    FixedChunkCount {
        minimum_chunk_size: usize,
        preferred_chunks_per_worker: usize,
    },
}

impl Default for SchedulerPolicy {
    fn default() -> Self {
        SchedulerPolicy::FixedChunkCount {
            minimum_chunk_size: 1,
            preferred_chunks_per_worker: 4,
        }
    }
}

impl SchedulerPolicy {
    /// Number of inputs per chunk; always at least one.
    pub fn chunk_size(&self, inputs: usize, workers: usize) -> usize {
        match *self {
            SchedulerPolicy::FixedChunkSize(size) => size.max(1),
            SchedulerPolicy::FixedChunkCount {
                minimum_chunk_size,
                preferred_chunks_per_worker,
            } => {
                let chunks = workers.max(1) * preferred_chunks_per_worker.max(1);
                inputs.div_ceil(chunks).max(minimum_chunk_size).max(1)
            }
        }
    }
}

/// Runs the per-callable work of one batch, either inline or on a rayon pool.
///
/// Results are reduced in input order, so with an associative `reduce` the
/// outcome does not depend on the number of workers.
#[derive(Debug, Default)]
pub struct Scheduler {
    pool: Option<ThreadPool>,
}

impl Scheduler {
    /// Run everything on the calling thread.
    pub fn sequential() -> Self {
        Scheduler { pool: None }
    }

    /// Run on a dedicated pool of `workers` threads.
    pub fn parallel(workers: usize) -> Result<Self, FixpointError> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|index| format!("fixpoint-worker-{index}"))
            .build()?;
        Ok(Scheduler { pool: Some(pool) })
    }

    pub fn workers(&self) -> usize {
        self.pool
            .as_ref()
            .map_or(1, |pool| pool.current_num_threads())
    }

    /// Fold every chunk of `inputs` with `map`, starting from `initial()`,
    /// and combine the chunk accumulators with `reduce`.
    ///
    /// The first error stops the batch; with a pool, chunks already running
    /// still finish.
    pub fn map_reduce<I, A, E>(
        &self,
        policy: SchedulerPolicy,
        inputs: &[I],
        initial: impl Fn() -> A + Sync + Send,
        map: impl Fn(A, &[I]) -> Result<A, E> + Sync + Send,
        reduce: impl Fn(A, A) -> A + Sync + Send,
    ) -> Result<A, E>
    where
        I: Sync,
        A: Send,
        E: Send,
    {
        let size = policy.chunk_size(inputs.len(), self.workers());
        match &self.pool {
            None => inputs
                .chunks(size)
                .try_fold(initial(), |accumulator, chunk| {
                    let mapped = map(initial(), chunk)?;
                    Ok(reduce(accumulator, mapped))
                }),
            Some(pool) => pool.install(|| {
                inputs
                    .par_chunks(size)
                    .map(|chunk| map(initial(), chunk))
                    .try_reduce(&initial, |left, right| Ok(reduce(left, right)))
            }),
        }
    }
}
