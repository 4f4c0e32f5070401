use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::{Duration, Instant},
};

use super::TxnId;
use crate::common::error::{FrameError, Result};

/// Execution context threaded through every suspending reader operation.
///
/// Clones share a single cancellation flag, so cancelling any clone cancels
/// all of them. A context may also carry a deadline and the transaction it
/// was bound to by [`TableReader::view`](super::TableReader::view).
#[derive(Debug, Clone, Default)]
pub struct TaskContext {
    cancelled: Arc<AtomicBool>,
    deadline: Option<Instant>,
    txn: Option<TxnId>,
}

impl TaskContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// Returns a clone bound to `txn`, sharing this context's cancellation.
    pub fn with_txn(&self, txn: TxnId) -> Self {
        Self {
            cancelled: Arc::clone(&self.cancelled),
            deadline: self.deadline,
            txn: Some(txn),
        }
    }

    pub fn txn(&self) -> Option<TxnId> {
        self.txn
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    /// True once cancelled or past the deadline.
    pub fn is_cancelled(&self) -> bool {
        self.check().is_err()
    }

    pub fn check(&self) -> Result<()> {
        if self.cancelled.load(Ordering::Acquire) {
            return Err(FrameError::Cancelled);
        }

        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Err(FrameError::DeadlineExceeded),
            _ => Ok(()),
        }
    }
}
