use crossbeam_channel::{Receiver, SendError, Sender, TrySendError, bounded};

use crate::job::Job;

/// Bounded FIFO of jobs shared between one producer and many workers.
///
/// The queue keeps its own sender and receiver alive for the whole run, so
/// `enqueue` can only fail if the queue itself has been dropped. Workers take
/// a cloned receiver and select on it alongside the shutdown signal.
///
/// A capacity of `0` is a rendezvous queue: every `enqueue` waits for a
/// worker to take the job and `len` is always `0`.
pub struct JobQueue {
    sender: Sender<Job>,
    receiver: Receiver<Job>,
    capacity: usize,
}

impl JobQueue {
    pub fn new(capacity: usize) -> Self {
        let (sender, receiver) = bounded(capacity);
        Self {
            sender,
            receiver,
            capacity,
        }
    }

    /// Blocks while the queue is full.
    pub fn enqueue(&self, job: Job) -> Result<(), SendError<Job>> {
        self.sender.send(job)
    }

    /// Hands the job back instead of blocking when the queue is full.
    pub fn try_enqueue(&self, job: Job) -> Result<(), TrySendError<Job>> {
        self.sender.try_send(job)
    }

    /// Blocks while the queue is empty. `None` once closed and drained.
    pub fn dequeue(&self) -> Option<Job> {
        self.receiver.recv().ok()
    }

    pub fn receiver(&self) -> Receiver<Job> {
        self.receiver.clone()
    }

    pub fn len(&self) -> usize {
        self.receiver.len()
    }

    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use std::{
        collections::HashSet,
        sync::Arc,
        thread,
        time::Duration,
    };

    use crossbeam_channel::TrySendError;

    use super::JobQueue;
    use crate::job::Job;

    #[test]
    fn test_queue_is_fifo() {
        let queue = JobQueue::new(8);
        for i in 0..8 {
            queue.enqueue(Job::new(i)).unwrap();
        }
        let order: Vec<usize> = (0..8).map(|_| queue.dequeue().unwrap().index()).collect();
        assert_eq!(order, (0..8).collect::<Vec<_>>());
    }

    #[test]
    fn test_queue_never_exceeds_capacity() {
        let capacity = 3;
        let queue = JobQueue::new(capacity);

        for i in 0..capacity {
            queue.try_enqueue(Job::new(i)).unwrap();
        }

        match queue.try_enqueue(Job::new(capacity)) {
            Err(TrySendError::Full(job)) => assert_eq!(job.index(), capacity),
            other => panic!("expected full queue, got {other:?}"),
        }
        assert_eq!(queue.len(), capacity);
        assert_eq!(queue.capacity(), capacity);
    }

    #[test]
    fn test_enqueue_blocks_until_slot_frees() {
        let queue = Arc::new(JobQueue::new(1));
        queue.enqueue(Job::new(0)).unwrap();

        let producer_queue = Arc::clone(&queue);
        let handle = thread::spawn(move || {
            producer_queue.enqueue(Job::new(1)).unwrap();
        });

        thread::sleep(Duration::from_millis(50));
        assert!(!handle.is_finished(), "enqueue returned while queue was full");

        assert_eq!(queue.dequeue(), Some(Job::new(0)));
        handle.join().unwrap();
        assert_eq!(queue.dequeue(), Some(Job::new(1)));
        assert!(queue.is_empty());
    }

    #[test]
    fn test_rendezvous_queue_reports_zero_len() {
        let queue = Arc::new(JobQueue::new(0));
        let receiver = queue.receiver();

        let handle = thread::spawn(move || receiver.recv().unwrap());
        queue.enqueue(Job::new(7)).unwrap();

        assert_eq!(handle.join().unwrap(), Job::new(7));
        assert_eq!(queue.len(), 0);
    }

    #[test]
    fn test_concurrent_consumers_see_each_job_once() {
        let num_jobs = 1_000;
        let num_consumers = 4;
        let queue = JobQueue::new(16);

        let handles: Vec<_> = (0..num_consumers)
            .map(|_| {
                let receiver = queue.receiver();
                thread::spawn(move || {
                    let mut seen = Vec::new();
                    while let Ok(job) = receiver.recv_timeout(Duration::from_millis(200)) {
                        seen.push(job.index());
                    }
                    seen
                })
            })
            .collect();

        for i in 0..num_jobs {
            queue.enqueue(Job::new(i)).unwrap();
        }

        let mut all = Vec::with_capacity(num_jobs);
        for handle in handles {
            all.extend(handle.join().unwrap());
        }

        let unique: HashSet<usize> = all.iter().copied().collect();
        assert_eq!(all.len(), num_jobs, "a job was lost or duplicated");
        assert_eq!(unique.len(), num_jobs);
    }
}
