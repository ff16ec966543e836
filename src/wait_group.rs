use std::{
    sync::{
        Arc, Condvar, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use tracing::warn;

use crate::safe_lock;

/// Counter that can be waited on until it reaches zero.
///
/// Backs both the active worker count (one `add` per spawned worker, one
/// `done` as it exits) and the pending job count (one per produced job, one
/// `done` as each finishes processing).
#[derive(Clone)]
pub struct WaitGroup {
    inner: Arc<WaitGroupInner>,
}

struct WaitGroupInner {
    count: AtomicUsize,
    cvar: Condvar,
    lock: Mutex<()>,
}

impl WaitGroup {
    pub fn new() -> Self {
        Self::new_with_delta(0)
    }

    pub fn new_with_delta(delta: usize) -> Self {
        Self {
            inner: Arc::new(WaitGroupInner {
                count: AtomicUsize::new(delta),
                cvar: Condvar::new(),
                lock: Mutex::new(()),
            }),
        }
    }

    pub fn add(&self, delta: usize) {
        let _guard = safe_lock(&self.inner.lock);
        self.inner.count.fetch_add(delta, Ordering::SeqCst);
    }

    /// Counts down by one. Never goes below zero.
    pub fn done(&self) {
        let _guard = safe_lock(&self.inner.lock);
        let prev = self
            .inner
            .count
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |c| c.checked_sub(1));

        match prev {
            Ok(1) => self.inner.cvar.notify_all(),
            Ok(_) => {}
            Err(_) => warn!("wait group counted down past zero, ignoring"),
        }
    }

    pub fn count(&self) -> usize {
        self.inner.count.load(Ordering::SeqCst)
    }

    pub fn wait(&self) {
        let mut guard = safe_lock(&self.inner.lock);
        while self.count() > 0 {
            guard = match self.inner.cvar.wait(guard) {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
        }
    }

    /// Returns `false` if the count was still above zero when `timeout` ran out.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let guard = safe_lock(&self.inner.lock);
        let result = self
            .inner
            .cvar
            .wait_timeout_while(guard, timeout, |_| self.count() > 0);

        match result {
            Ok((_, timeout_result)) => !timeout_result.timed_out(),
            Err(poisoned) => !poisoned.into_inner().1.timed_out(),
        }
    }
}

impl Default for WaitGroup {
    fn default() -> Self {
        Self::new()
    }
}
