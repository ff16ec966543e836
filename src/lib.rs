//! A micro-benchmark harness for a fixed-size worker pool draining a bounded job queue.
//!
//! One producer pushes `iterations` jobs into a queue of fixed capacity while `workers`
//! threads pull from it, each sleeping for a fixed delay per job. Once the queue has
//! drained, a broadcast shutdown signal tells every worker to exit, and the harness
//! reports how long the jobs took and how many jobs per second that works out to.
//!
//! Use it to see how queue depth, worker count, per-job delay and parallelism move
//! throughput and shutdown latency.
//!
//! # Examples
//!
//! ## Defaults
//!
//! Ten workers, a queue of ten, one hundred jobs, no delay, one execution unit.
//!
//! ```rust
//! use qbench::{Args, Harness, RunConfig};
//!
//! let config = RunConfig::resolve(&Args::default());
//! let report = Harness::new(config).run().unwrap();
//!
//! assert_eq!(report.jobs_processed(), 100);
//! println!("{report}");
//! ```
//!
//! ## Blocking queue
//!
//! Blocking mode forces the queue capacity to 1, whatever `queue_size` says, so every
//! hand-off waits for a worker to make room.
//!
//! ```rust
//! use qbench::{Args, Harness, RunConfig};
//!
//! let args = Args {
//!     workers: 4,
//!     iterations: 20,
//!     queue_size: 100,
//!     blocking: true,
//!     ..Args::default()
//! };
//!
//! let config = RunConfig::resolve(&args);
//! assert_eq!(config.queue_capacity, 1);
//!
//! let report = Harness::new(config).run().unwrap();
//! assert_eq!(report.worker_jobs.iter().sum::<usize>(), 20);
//! ```
//!
//! ## Use every CPU
//!
//! A parallelism of `0`, or more than the host has, means all available execution units.
//!
//! ```rust
//! use qbench::{Args, RunConfig, available_units};
//!
//! let args = Args { num_cpus: 0, ..Args::default() };
//! assert_eq!(RunConfig::resolve(&args).parallelism, available_units());
//! ```
//!
//! ## Timing only the queue
//!
//! By default the clock stops once every job has finished processing. `DrainMode::Queue`
//! stops it as soon as the queue reads empty, even if workers are still sleeping
//! through their last job.
//!
//! ```rust
//! use std::time::Duration;
//! use qbench::{Args, DrainMode, Harness, RunConfig};
//!
//! let args = Args {
//!     delay: 500,
//!     drain: DrainMode::Queue,
//!     ..Args::default()
//! };
//!
//! let report = Harness::new(RunConfig::resolve(&args)).run().unwrap();
//!
//! // Workers finish the jobs they hold before they see shutdown, so every job
//! // is still processed even though the clock may have stopped earlier.
//! assert_eq!(report.jobs_processed(), 100);
//! assert!(report.elapsed < Duration::from_secs(10));
//! ```
//!
#[macro_use]
mod macros;


mod channel;
mod config;
mod error;
mod harness;
mod job;
mod report;
mod signal;
mod units;
mod wait_group;
mod worker;

pub use channel::JobQueue;
pub use config::{Args, DrainMode, RunConfig, resolve_capacity, resolve_parallelism};
pub use error::{HarnessError, HarnessResult};
pub use harness::{DRAIN_POLL_INTERVAL, Harness};
pub use job::Job;
pub use report::{Console, RunReport};
pub use signal::ShutdownSignal;
pub use units::{ExecutionUnits, available_units, default_units};
pub use wait_group::WaitGroup;

use std::sync::{Mutex, MutexGuard};

/************************************* safe_lock *****************************************/

// One-liner that allows us to easily lock a Mutex while handling possible poison.
pub(crate) fn safe_lock<T: ?Sized>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    match m.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
