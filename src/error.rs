use std::io;

use thiserror::Error;

/// Failures of the threading plumbing underneath a run.
///
/// Configuration is never rejected; these only surface when the host refuses
/// to give us threads, or a worker thread dies.
#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("failed to build {units} execution unit(s): {source}")]
    ExecutionUnits {
        units: usize,
        #[source]
        source: rayon::ThreadPoolBuildError,
    },

    #[error("failed to spawn worker {id}: {source}")]
    SpawnWorker {
        id: usize,
        #[source]
        source: io::Error,
    },

    #[error("worker {id} panicked")]
    WorkerPanicked { id: usize },

    #[error("job queue has no receivers")]
    QueueDisconnected,
}

pub type HarnessResult<T> = Result<T, HarnessError>;
