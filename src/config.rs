use std::time::Duration;

use clap::{Parser, ValueEnum};

use crate::units::available_units;

/// How the coordinator decides the queue has drained before it stops the clock.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum DrainMode {
    /// Wait until every produced job has finished processing.
    #[default]
    Completion,
    /// Poll the queue length until it reads zero. Jobs still being processed
    /// are not waited for.
    Queue,
}

#[derive(Parser, Clone, Debug)]
#[command(
    name = "qbench",
    version,
    about = "Measure worker pool throughput draining a bounded job queue"
)]
pub struct Args {
    /// Microsecond delay after a worker takes a job, before it takes another
    #[arg(short = 'd', default_value_t = 0)]
    pub delay: u64,

    /// Number of jobs to run
    #[arg(short = 'i', default_value_t = 100)]
    pub iterations: usize,

    /// Number of jobs the queue holds
    #[arg(short = 'q', default_value_t = 10)]
    pub queue_size: usize,

    /// Number of worker threads
    #[arg(short = 'w', default_value_t = 10)]
    pub workers: usize,

    /// Blocking queue behavior (capacity 1)
    #[arg(short = 'b')]
    pub blocking: bool,

    /// Number of logical CPUs to use (0 means use all)
    #[arg(short = 'p', default_value_t = 1)]
    pub num_cpus: usize,

    /// Detailed output
    #[arg(short = 'v')]
    pub verbose: bool,

    /// Debug output, `+` per job sent and `-` per job taken
    #[arg(short = 'D')]
    pub debug: bool,

    /// How to detect that all jobs have been handled
    #[arg(long, value_enum, default_value_t = DrainMode::Completion)]
    pub drain: DrainMode,
}

impl Default for Args {
    fn default() -> Self {
        Self {
            delay: 0,
            iterations: 100,
            queue_size: 10,
            workers: 10,
            blocking: false,
            num_cpus: 1,
            verbose: false,
            debug: false,
            drain: DrainMode::Completion,
        }
    }
}

/// Settings for one run. Built once, then cloned into the coordinator and
/// every worker.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunConfig {
    pub workers: usize,
    pub iterations: usize,
    pub queue_capacity: usize,
    pub delay: Duration,
    pub parallelism: usize,
    pub blocking: bool,
    pub verbose: bool,
    pub debug: bool,
    pub drain: DrainMode,
}

impl RunConfig {
    pub fn resolve(args: &Args) -> Self {
        Self::resolve_with(args, available_units())
    }

    /// Same as `resolve`, with the host's execution units given explicitly.
    pub fn resolve_with(args: &Args, available: usize) -> Self {
        Self {
            workers: args.workers,
            iterations: args.iterations,
            queue_capacity: resolve_capacity(args.queue_size, args.blocking),
            delay: Duration::from_micros(args.delay),
            parallelism: resolve_parallelism(args.num_cpus, available),
            blocking: args.blocking,
            verbose: args.verbose,
            debug: args.debug,
            drain: args.drain,
        }
    }
}

/// `0`, or more than the host has, means all of them.
pub fn resolve_parallelism(requested: usize, available: usize) -> usize {
    if requested == 0 || requested > available {
        available
    } else {
        requested
    }
}

pub fn resolve_capacity(requested: usize, blocking: bool) -> usize {
    if blocking { 1 } else { requested }
}
