use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::operation::FileOperation;

/// FIFO of deferred operations.
///
/// Any number of threads may enqueue concurrently; the lock is held only
/// for the push, so records keep the order in which their pushes landed.
#[derive(Debug, Default)]
pub struct OperationQueue {
    records: Mutex<VecDeque<FileOperation>>,
}

impl OperationQueue {
    pub fn new() -> Self {
        Self::default()
    }

    fn records(&self) -> MutexGuard<'_, VecDeque<FileOperation>> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append a record at the tail.
    pub fn enqueue(&self, record: FileOperation) {
        self.records().push_back(record);
    }

    /// Put a record pulled by [`Drain`] back at the head.
    pub fn requeue_front(&self, record: FileOperation) {
        self.records().push_front(record);
    }

    /// Take records from the head, one per `next()`.
    ///
    /// Records that are never pulled stay queued.
    pub fn drain_in_order(&self) -> Drain<'_> {
        Drain { queue: self }
    }

    pub fn len(&self) -> usize {
        self.records().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records().is_empty()
    }
}

/// Lazy head-first iterator over an [`OperationQueue`].
#[derive(Debug)]
pub struct Drain<'a> {
    queue: &'a OperationQueue,
}

impl Iterator for Drain<'_> {
    type Item = FileOperation;

    fn next(&mut self) -> Option<Self::Item> {
        self.queue.records().pop_front()
    }
}
