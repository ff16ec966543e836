use std::{
    fmt::{self, Debug, Display, Formatter},
    io::{self, Write},
    sync::{Arc, Mutex},
    time::Duration,
};

use crate::{config::RunConfig, safe_lock};

/// Where verbose and debug output goes. Cloned into every worker; the clones
/// share one writer, and each write holds it for the whole message.
#[derive(Clone)]
pub struct Console {
    pub verbose: bool,
    pub debug: bool,
    out: Arc<Mutex<dyn Write + Send>>,
}

impl Console {
    /// Writes to stdout.
    pub fn new(verbose: bool, debug: bool) -> Self {
        Self::with_writer(verbose, debug, Arc::new(Mutex::new(io::stdout())))
    }

    pub fn with_writer(verbose: bool, debug: bool, out: Arc<Mutex<dyn Write + Send>>) -> Self {
        Self {
            verbose,
            debug,
            out,
        }
    }

    pub(crate) fn write(&self, args: fmt::Arguments) {
        let mut out = safe_lock(&self.out);
        let _ = out.write_fmt(args);
        let _ = out.flush();
    }
}

impl Default for Console {
    fn default() -> Self {
        Self::new(false, false)
    }
}

impl Debug for Console {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.debug_struct("Console")
            .field("verbose", &self.verbose)
            .field("debug", &self.debug)
            .finish_non_exhaustive()
    }
}

impl From<&RunConfig> for Console {
    fn from(config: &RunConfig) -> Self {
        Self::new(config.verbose, config.debug)
    }
}

/// Outcome of one run.
#[derive(Clone, Debug)]
pub struct RunReport {
    /// From the first enqueue until drain was observed.
    pub elapsed: Duration,
    pub iterations: usize,
    /// Jobs processed by each worker, indexed by worker id.
    pub worker_jobs: Vec<usize>,
    /// From firing shutdown until the last worker acknowledged it.
    pub shutdown_latency: Duration,
}

impl RunReport {
    pub fn elapsed_secs(&self) -> f64 {
        self.elapsed.as_secs_f64()
    }

    /// `inf` when nothing measurable elapsed.
    pub fn jobs_per_second(&self) -> f64 {
        let secs = self.elapsed_secs();
        if secs == 0.0 {
            return f64::INFINITY;
        }
        self.iterations as f64 / secs
    }

    pub fn jobs_processed(&self) -> usize {
        self.worker_jobs.iter().sum()
    }
}

impl Display for RunReport {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        writeln!(f)?;
        writeln!(f, "Elapsed time: {:.4} secs", self.elapsed_secs())?;
        writeln!(f, "Jobs per second: {:.4}", self.jobs_per_second())
    }
}
