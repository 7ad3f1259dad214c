//! Bounded worker pool for extraction and manifest downloads
//!
//! One code path for every concurrency degree: `--jobs 1` builds a pool with
//! a single thread, so sequential runs go through the same scheduling as
//! parallel ones.

use std::fmt;
use std::num::NonZeroUsize;

use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::error::{Result, SliceDbError};

/// Requested concurrency degree
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Jobs {
    Limited(NonZeroUsize),
    /// One worker per task
    Unlimited,
}

impl Jobs {
    pub const SEQUENTIAL: Jobs = Jobs::Limited(NonZeroUsize::MIN);

    /// Interpret a `--jobs` value: `N > 0` bounded, `-1` unlimited
    pub fn from_arg(value: i64) -> Result<Self> {
        match value {
            -1 => Ok(Jobs::Unlimited),
            n if n > 0 => usize::try_from(n)
                .ok()
                .and_then(NonZeroUsize::new)
                .map(Jobs::Limited)
                .ok_or_else(|| SliceDbError::Config {
                    message: format!("--jobs value {} is too large", n),
                }),
            n => Err(SliceDbError::Config {
                message: format!("--jobs must be a positive number or -1, got {}", n),
            }),
        }
    }

    /// Number of threads to run `task_count` tasks with
    pub fn threads_for(&self, task_count: usize) -> usize {
        match self {
            Jobs::Limited(n) => n.get(),
            Jobs::Unlimited => task_count.max(1),
        }
    }
}

impl Default for Jobs {
    fn default() -> Self {
        Jobs::SEQUENTIAL
    }
}

impl fmt::Display for Jobs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Jobs::Limited(n) => write!(f, "{}", n),
            Jobs::Unlimited => f.write_str("unlimited"),
        }
    }
}

/// A dedicated rayon pool; work never lands on the global pool
pub struct WorkerPool {
    pool: ThreadPool,
}

impl WorkerPool {
    pub fn new(jobs: Jobs, task_count: usize) -> Result<Self> {
        let threads = jobs.threads_for(task_count);
        let pool = ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("slicedb-worker-{}", i))
            .build()
            .map_err(|e| SliceDbError::Config {
                message: format!("Failed to start {} worker threads: {}", threads, e),
            })?;
        tracing::debug!("Worker pool started with {} threads", threads);
        Ok(Self { pool })
    }

    pub fn threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Apply `f` to every item inside the pool
    ///
    /// Results come back in input order. The first error stops scheduling of
    /// further items and is returned.
    pub fn map<T, R, F>(&self, items: &[T], f: F) -> Result<Vec<R>>
    where
        T: Sync,
        R: Send,
        F: Fn(&T) -> Result<R> + Sync + Send,
    {
        self.pool
            .install(|| items.par_iter().map(|item| f(item)).collect::<Result<Vec<R>>>())
    }

    /// Run two independent jobs concurrently inside the pool
    pub fn join<A, B, RA, RB>(&self, a: A, b: B) -> (RA, RB)
    where
        A: FnOnce() -> RA + Send,
        B: FnOnce() -> RB + Send,
        RA: Send,
        RB: Send,
    {
        self.pool.install(|| rayon::join(a, b))
    }
}
