use std::sync::Mutex;

use crossbeam_channel::{Receiver, Sender, TryRecvError, bounded};

use crate::safe_lock;

/// One-shot broadcast shutdown.
///
/// Nothing is ever sent on the underlying channel. Firing drops the only
/// sender, after which every receiver handed out by `subscribe` reports
/// disconnection on every `recv`, so the signal stays fired for the rest of
/// the run and is seen by any number of workers.
pub struct ShutdownSignal {
    sender: Mutex<Option<Sender<()>>>,
    receiver: Receiver<()>,
}

impl ShutdownSignal {
    pub fn new() -> Self {
        let (sender, receiver) = bounded(0);
        Self {
            sender: Mutex::new(Some(sender)),
            receiver,
        }
    }

    /// Returns `true` only for the call that actually fired the signal.
    pub fn fire(&self) -> bool {
        if let Some(sender) = safe_lock(&self.sender).take() {
            drop(sender);
            return true;
        }
        false
    }

    pub fn is_fired(&self) -> bool {
        matches!(self.receiver.try_recv(), Err(TryRecvError::Disconnected))
    }

    /// Receiver to select on. It becomes ready (disconnected) once fired.
    pub fn subscribe(&self) -> Receiver<()> {
        self.receiver.clone()
    }
}

impl Default for ShutdownSignal {
    fn default() -> Self {
        Self::new()
    }
}
