use std::sync::atomic::{AtomicUsize, Ordering};

use filestore_core::{FileStoreError, Result};

/// Counts a session's round trips against a ceiling.
///
/// The count only grows. Once it has passed the ceiling every further charge
/// fails, even if the ceiling is raised by less than the overshoot.
#[derive(Debug)]
pub struct RequestGovernor {
    count: AtomicUsize,
    max: AtomicUsize,
}

impl RequestGovernor {
    pub fn new(max: usize) -> Self {
        Self {
            count: AtomicUsize::new(0),
            max: AtomicUsize::new(max),
        }
    }

    /// Charge one round trip, returning the new count.
    pub fn charge(&self) -> Result<usize> {
        let count = self.count.fetch_add(1, Ordering::SeqCst) + 1;
        let max = self.max.load(Ordering::SeqCst);
        if count > max {
            return Err(FileStoreError::RequestBudgetExceeded { max });
        }
        Ok(count)
    }

    pub fn current_count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }

    pub fn max_requests(&self) -> usize {
        self.max.load(Ordering::SeqCst)
    }

    pub fn set_max_requests(&self, max: usize) {
        self.max.store(max, Ordering::SeqCst);
    }
}
