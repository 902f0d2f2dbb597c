//! Worker-pool configuration for the parallel support phase.
//!
//! Rather than a process-wide thread count, each run receives a
//! [`ParallelConfig`] naming the number of workers and how work is split
//! between them. A private `rayon` pool is built per run, so library callers
//! with their own global pool are unaffected.

use std::sync::{Mutex, PoisonError};

use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::error::Result;

/// How items of a parallel loop are handed out to workers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Schedule {
    /// Every item is its own task; idle workers steal pending items. Suits
    /// loops where per-item cost varies a lot.
    WorkStealing,
    /// Items are grouped into runs of at least `min_len` before being split
    /// across workers.
    Chunked { min_len: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParallelConfig {
    pub workers: usize,
    pub schedule: Schedule,
}

impl Default for ParallelConfig {
    /// One worker per available processor, dynamic scheduling.
    fn default() -> Self {
        ParallelConfig {
            workers: num_cpus::get(),
            schedule: Schedule::WorkStealing,
        }
    }
}

impl ParallelConfig {
    /// Default configuration with `workers` threads; `0` keeps the default count.
    pub fn with_workers(workers: usize) -> Self {
        let mut config = ParallelConfig::default();
        if workers > 0 {
            config.workers = workers;
        }
        config
    }

    pub fn with_schedule(mut self, schedule: Schedule) -> Self {
        self.schedule = schedule;
        self
    }

    pub fn build_pool(&self) -> Result<ThreadPool> {
        Ok(ThreadPoolBuilder::new()
            .num_threads(self.workers.max(1))
            .build()?)
    }

    /// Map `f` over `items` on `pool`, returning results in item order.
    ///
    /// Each pool thread owns one scratch value, created by `init` the first
    /// time that thread picks up an item and handed to `f` mutably for every
    /// item it processes afterwards. `f` must not start nested parallel work
    /// on `pool`.
    pub fn map_init<T, S, R, I, F>(&self, pool: &ThreadPool, items: &[T], init: I, f: F) -> Vec<R>
    where
        T: Sync,
        S: Send,
        R: Send,
        I: Fn() -> S + Sync + Send,
        F: Fn(&mut S, &T) -> R + Sync + Send,
    {
        let slots: Vec<Mutex<Option<S>>> = (0..pool.current_num_threads().max(1))
            .map(|_| Mutex::new(None))
            .collect();
        let run = |item: &T| {
            let slot = rayon::current_thread_index().unwrap_or(0) % slots.len();
            let mut scratch = slots[slot].lock().unwrap_or_else(PoisonError::into_inner);
            f(scratch.get_or_insert_with(&init), item)
        };

        pool.install(|| match self.schedule {
            Schedule::WorkStealing => items.par_iter().with_max_len(1).map(run).collect(),
            Schedule::Chunked { min_len } => items
                .par_iter()
                .with_min_len(min_len.max(1))
                .map(run)
                .collect(),
        })
    }
}
