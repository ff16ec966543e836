use std::{
    hint::black_box,
    sync::Arc,
    thread::{self, JoinHandle},
    time::Duration,
};

use crossbeam_channel::{Receiver, select};
use tracing::{debug, trace};

use crate::{
    error::{HarnessError, HarnessResult},
    job::Job,
    report::Console,
    units::ExecutionUnits,
    wait_group::WaitGroup,
};

/// Everything a worker shares with the coordinator.
#[derive(Clone)]
pub(crate) struct WorkerContext {
    pub(crate) jobs: Receiver<Job>,
    pub(crate) shutdown: Receiver<()>,
    pub(crate) active: WaitGroup,
    pub(crate) pending: WaitGroup,
    pub(crate) units: Arc<ExecutionUnits>,
    pub(crate) delay: Duration,
    pub(crate) console: Console,
}

pub(crate) struct Worker {
    id: usize,
    handle: Option<JoinHandle<usize>>,
}

impl Worker {
    /// Counts the worker as active before its thread starts, so the
    /// coordinator can never observe zero active workers while one is still
    /// on its way up.
    pub(crate) fn spawn(id: usize, ctx: WorkerContext) -> HarnessResult<Self> {
        ctx.active.add(1);
        let active = ctx.active.clone();

        let spawned = thread::Builder::new()
            .name(format!("qbench-worker-{id}"))
            .spawn(move || run(id, ctx));

        match spawned {
            Ok(handle) => Ok(Self {
                id,
                handle: Some(handle),
            }),
            Err(source) => {
                active.done();
                Err(HarnessError::SpawnWorker { id, source })
            }
        }
    }

    pub(crate) fn id(&self) -> usize {
        self.id
    }

    /// Number of jobs this worker processed.
    pub(crate) fn join(&mut self) -> HarnessResult<usize> {
        match self.handle.take() {
            Some(handle) => handle
                .join()
                .map_err(|_| HarnessError::WorkerPanicked { id: self.id }),
            None => Ok(0),
        }
    }
}

// Counts the worker out however its thread ends.
struct ActiveGuard(WaitGroup);

impl Drop for ActiveGuard {
    fn drop(&mut self) {
        self.0.done();
    }
}

fn run(id: usize, ctx: WorkerContext) -> usize {
    let _active = ActiveGuard(ctx.active.clone());
    debug!(worker_id = id, "worker started");

    let mut processed = 0;

    loop {
        // When both are ready select picks one at random, so neither side
        // starves the other.
        select! {
            recv(ctx.shutdown) -> _ => break,
            recv(ctx.jobs) -> job => match job {
                Ok(job) => {
                    debug_mark!(ctx.console, "-");
                    processed += 1;
                    process(&ctx, job);
                }
                Err(_) => break,
            },
        }
    }

    verbose!(ctx.console, "\tworker exiting ({processed} jobs processed)\n");
    debug!(worker_id = id, processed, "worker exiting");
    processed
}

fn process(ctx: &WorkerContext, job: Job) {
    trace!(job = job.index(), "processing");
    ctx.units.run(|| black_box(job));
    // The delay is a suspension point: it sleeps on the worker's own thread
    // and does not hold an execution unit.
    if !ctx.delay.is_zero() {
        thread::sleep(ctx.delay);
    }
    ctx.pending.done();
}
