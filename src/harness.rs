use std::{
    sync::Arc,
    thread,
    time::{Duration, Instant},
};

use tracing::{debug, info, warn};

use crate::{
    channel::JobQueue,
    config::{DrainMode, RunConfig},
    error::{HarnessError, HarnessResult},
    job::Job,
    report::{Console, RunReport},
    signal::ShutdownSignal,
    units::{ExecutionUnits, default_units},
    wait_group::WaitGroup,
    worker::{Worker, WorkerContext},
};

/// Interval between queue length reads in `DrainMode::Queue`.
pub const DRAIN_POLL_INTERVAL: Duration = Duration::from_millis(1);

/// Runs one benchmark: spawns the workers, feeds them every job, waits for
/// the queue to drain, shuts the workers down and reports timing.
pub struct Harness {
    config: RunConfig,
    console: Console,
    queue: JobQueue,
    shutdown: ShutdownSignal,
    active: WaitGroup,
    pending: WaitGroup,
}

impl Harness {
    pub fn new(config: RunConfig) -> Self {
        let console = Console::from(&config);
        Self::with_console(config, console)
    }

    /// Like `new`, but verbose and debug output go to `console` instead of
    /// stdout.
    pub fn with_console(config: RunConfig, console: Console) -> Self {
        Self {
            console,
            queue: JobQueue::new(config.queue_capacity),
            shutdown: ShutdownSignal::new(),
            active: WaitGroup::new(),
            pending: WaitGroup::new(),
            config,
        }
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Runs the benchmark to completion. Consumes the harness: its queue and
    /// shutdown signal are good for exactly one run.
    pub fn run(self) -> HarnessResult<RunReport> {
        let units = Arc::new(ExecutionUnits::new(self.config.parallelism)?);
        self.print_parameters(default_units());
        info!(
            workers = self.config.workers,
            iterations = self.config.iterations,
            queue_capacity = self.config.queue_capacity,
            delay_us = self.config.delay.as_micros() as u64,
            parallelism = units.count(),
            drain = ?self.config.drain,
            "starting run"
        );

        if self.config.workers == 0 && self.config.iterations > self.config.queue_capacity {
            warn!(
                iterations = self.config.iterations,
                queue_capacity = self.config.queue_capacity,
                "no workers to drain the queue, this run will not finish"
            );
        }

        let mut workers = match self.spawn_workers(&units) {
            Ok(workers) => workers,
            Err(e) => {
                // Let whatever did start wind down before bailing.
                self.fire_shutdown();
                self.active.wait();
                return Err(e);
            }
        };

        let (elapsed, produced) = self.produce_and_drain();

        let shutdown_started = Instant::now();
        self.fire_shutdown();
        if let Err(e) = produced {
            self.active.wait();
            return Err(e);
        }

        // Every worker has printed its exit line once this returns.
        self.active.wait();
        let shutdown_latency = shutdown_started.elapsed();
        debug!(?shutdown_latency, "all workers exited");
        verbose!(self.console, "\tshutdown took {shutdown_latency:.2?}\n");

        let mut worker_jobs = vec![0; workers.len()];
        for worker in workers.iter_mut() {
            worker_jobs[worker.id()] = worker.join()?;
        }

        Ok(RunReport {
            elapsed,
            iterations: self.config.iterations,
            worker_jobs,
            shutdown_latency,
        })
    }

    fn print_parameters(&self, previous_units: usize) {
        let c = &self.config;
        verbose!(self.console, "# workers: {}\n", c.workers);
        verbose!(
            self.console,
            "Worker delay: {} microsecond(s)\n",
            c.delay.as_micros()
        );
        verbose!(self.console, "Queue size: {}\n", c.queue_capacity);
        verbose!(self.console, "Blocking: {}\n", c.blocking);
        verbose!(self.console, "Iterations: {}\n", c.iterations);
        verbose!(
            self.console,
            "# CPUs: {} (was {})\n",
            c.parallelism,
            previous_units
        );
        verbose!(self.console, "\n");
    }

    fn spawn_workers(&self, units: &Arc<ExecutionUnits>) -> HarnessResult<Vec<Worker>> {
        verbose!(self.console, "\tspawning {} workers\n", self.config.workers);

        let ctx = WorkerContext {
            jobs: self.queue.receiver(),
            shutdown: self.shutdown.subscribe(),
            active: self.active.clone(),
            pending: self.pending.clone(),
            units: Arc::clone(units),
            delay: self.config.delay,
            console: self.console.clone(),
        };

        (0..self.config.workers)
            .map(|id| Worker::spawn(id, ctx.clone()))
            .collect()
    }

    // Returns the time from the first enqueue until drain was observed.
    fn produce_and_drain(&self) -> (Duration, HarnessResult<()>) {
        let iterations = self.config.iterations;
        verbose!(self.console, "\tsending {iterations} jobs to queue(s)\n");

        self.pending.add(iterations);
        let start = Instant::now();

        for i in 0..iterations {
            debug_mark!(self.console, "+");
            if self.queue.enqueue(Job::new(i)).is_err() {
                return (start.elapsed(), Err(HarnessError::QueueDisconnected));
            }
        }

        verbose!(self.console, "\n\tWaiting for jobs to complete...\n");
        self.wait_for_drain();
        let elapsed = start.elapsed();
        verbose!(self.console, "\n");

        debug!(?elapsed, "queue drained");
        (elapsed, Ok(()))
    }

    fn wait_for_drain(&self) {
        match self.config.drain {
            DrainMode::Completion => self.pending.wait(),
            DrainMode::Queue => {
                while !self.queue.is_empty() {
                    thread::sleep(DRAIN_POLL_INTERVAL);
                }
            }
        }
    }

    // Safe to call more than once; only the first call fires.
    fn fire_shutdown(&self) {
        if self.shutdown.fire() {
            debug!("shutdown signal fired");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{
        io::Write,
        sync::{Arc, Mutex},
        time::Duration,
    };

    use super::Harness;
    use crate::{
        config::{Args, DrainMode, RunConfig},
        report::Console,
        units::default_units,
    };

    fn config(workers: usize, iterations: usize, queue_size: usize) -> RunConfig {
        RunConfig::resolve_with(
            &Args {
                workers,
                iterations,
                queue_size,
                ..Args::default()
            },
            4,
        )
    }

    #[test]
    fn test_basic() {
        let report = Harness::new(config(3, 30, 5)).run().unwrap();
        assert_eq!(report.jobs_processed(), 30);
        assert_eq!(report.worker_jobs.len(), 3);
    }

    #[test]
    fn test_new_harness_keeps_config() {
        let harness = Harness::new(config(2, 10, 5));
        assert_eq!(harness.config().workers, 2);
        assert_eq!(harness.config().queue_capacity, 5);
    }

    #[test]
    fn test_queue_drain_mode() {
        let mut cfg = config(2, 50, 4);
        cfg.drain = DrainMode::Queue;
        let report = Harness::new(cfg).run().unwrap();
        // Workers finish whatever they took before acknowledging shutdown.
        assert_eq!(report.jobs_processed(), 50);
    }

    #[test]
    fn test_delays_overlap_on_a_single_unit() {
        let mut cfg = config(10, 100, 10);
        cfg.delay = Duration::from_millis(10);
        assert_eq!(cfg.parallelism, 1);

        let report = Harness::new(cfg).run().unwrap();
        assert_eq!(report.jobs_processed(), 100);

        // Some worker took at least ten jobs, and completion drain waits for it.
        assert!(
            report.elapsed >= Duration::from_millis(100),
            "stopped the clock before jobs finished: {:?}",
            report.elapsed
        );
        // One after another the sleeps would add up to a full second.
        assert!(
            report.elapsed < Duration::from_millis(600),
            "sleeping workers did not overlap: {:?}",
            report.elapsed
        );
    }

    #[test]
    fn test_console_output() {
        let workers = 3;
        let iterations = 12;
        let buf = Arc::new(Mutex::new(Vec::<u8>::new()));
        let sink: Arc<Mutex<dyn Write + Send>> = buf.clone();
        let console = Console::with_writer(true, true, sink);

        let report = Harness::with_console(config(workers, iterations, 4), console)
            .run()
            .unwrap();
        assert_eq!(report.jobs_processed(), iterations);

        let out = String::from_utf8(buf.lock().unwrap().clone()).unwrap();
        assert!(out.starts_with("# workers: 3\nWorker delay: 0 microsecond(s)\n"));
        assert!(out.contains("Queue size: 4\nBlocking: false\nIterations: 12\n"));
        assert!(out.contains(&format!("# CPUs: 1 (was {})\n\n", default_units())));
        assert!(out.contains("\tspawning 3 workers\n"));
        assert!(out.contains("\tsending 12 jobs to queue(s)\n"));

        // Debug marks carry no newline, so an exit line can follow marks directly.
        let exits: Vec<usize> = out
            .split("\tworker exiting (")
            .skip(1)
            .map(|rest| {
                let (count, tail) = rest.split_once(' ').unwrap();
                assert!(tail.starts_with("jobs processed)\n"));
                count.parse().unwrap()
            })
            .collect();
        assert_eq!(exits.len(), workers);
        assert_eq!(exits.iter().sum::<usize>(), iterations);

        assert_eq!(out.matches('+').count(), iterations);
        assert_eq!(out.matches('-').count(), iterations);
    }

    #[test]
    fn test_blocking_mode() {
        let args = Args {
            workers: 2,
            iterations: 25,
            queue_size: 100,
            blocking: true,
            num_cpus: 2,
            ..Args::default()
        };
        let cfg = RunConfig::resolve_with(&args, 4);
        assert_eq!(cfg.queue_capacity, 1);
        let report = Harness::new(cfg).run().unwrap();
        assert_eq!(report.jobs_processed(), 25);
    }

    #[test]
    fn test_rendezvous_queue() {
        let report = Harness::new(config(2, 25, 0)).run().unwrap();
        assert_eq!(report.jobs_processed(), 25);
    }
}
