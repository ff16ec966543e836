use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::error::{HarnessError, HarnessResult};

/// Threads permitted to handle jobs at the same time.
///
/// Workers block in their select and sleep through the per-job delay on
/// their own threads. Only the handling of a dequeued job runs here, so
/// `count` bounds how many jobs are being handled at once, never how many
/// are sleeping.
pub struct ExecutionUnits {
    pool: ThreadPool,
    count: usize,
}

impl ExecutionUnits {
    pub fn new(count: usize) -> HarnessResult<Self> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(count)
            .thread_name(|i| format!("qbench-unit-{i}"))
            .build()
            .map_err(|source| HarnessError::ExecutionUnits {
                units: count,
                source,
            })?;

        Ok(Self { pool, count })
    }

    /// Runs `f` on one of the units, blocking the caller until it returns.
    pub fn run<F, R>(&self, f: F) -> R
    where
        F: FnOnce() -> R + Send,
        R: Send,
    {
        self.pool.install(f)
    }

    pub fn count(&self) -> usize {
        self.count
    }
}

/// Size of the process-wide default pool, i.e. what parallelism was before a
/// run picked its own.
pub fn default_units() -> usize {
    rayon::current_num_threads()
}

/// Execution units the host reports, falling back to one.
pub fn available_units() -> usize {
    match std::thread::available_parallelism() {
        Ok(parallelism) => parallelism.get(),
        Err(_) => 1,
    }
}
