//! Ready-gated admission pool and the recursive submission shape.

use crate::core::error::PoolError;
use crate::core::pool::ProcessPool;
use crate::process::{ProcessStatus, SharedProcess};

/// What a caller may hand to [`WaitPool::add`]: a single process or an
/// ordered batch of further submissions, nested arbitrarily.
///
/// The batch is flattened depth-first in order, so the relative order of
/// leaves is the admission order. Every leaf is a process by construction,
/// which is what makes a malformed submission unrepresentable.
pub enum Submission {
    /// One process handle.
    Process(SharedProcess),
    /// An ordered collection of submissions.
    Batch(Vec<Submission>),
}

impl From<SharedProcess> for Submission {
    fn from(process: SharedProcess) -> Self {
        Self::Process(process)
    }
}

impl From<Vec<SharedProcess>> for Submission {
    fn from(processes: Vec<SharedProcess>) -> Self {
        Self::Batch(processes.into_iter().map(Self::Process).collect())
    }
}

impl From<Vec<Submission>> for Submission {
    fn from(submissions: Vec<Submission>) -> Self {
        Self::Batch(submissions)
    }
}

impl From<ProcessPool> for Submission {
    fn from(pool: ProcessPool) -> Self {
        Self::from(pool.into_processes())
    }
}

impl From<WaitPool> for Submission {
    fn from(pool: WaitPool) -> Self {
        Self::from(pool.inner.into_processes())
    }
}

/// A [`ProcessPool`] that only admits processes in the ready state.
///
/// Readiness is checked per leaf at admission time only; a queued process
/// whose status changes later is not re-validated.
#[derive(Default)]
pub struct WaitPool {
    inner: ProcessPool,
}

impl WaitPool {
    /// Create an empty pool.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Flatten `submission` and admit each leaf in order.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::NotReady`] for a leaf that is not in the ready
    /// state and [`PoolError::AlreadyInPool`] for a repeated identity,
    /// including repeats across separate calls. Leaves admitted before the
    /// failing one stay admitted; there is no rollback.
    pub fn add(&mut self, submission: impl Into<Submission>) -> Result<(), PoolError> {
        self.add_submission(submission.into())
    }

    fn add_submission(&mut self, submission: Submission) -> Result<(), PoolError> {
        match submission {
            Submission::Process(process) => {
                let (id, status) = {
                    let guard = process.lock();
                    (guard.id(), guard.status())
                };
                if status != ProcessStatus::Ready {
                    return Err(PoolError::NotReady {
                        id,
                        status,
                        process,
                    });
                }
                self.inner.add(process)
            }
            Submission::Batch(items) => {
                for item in items {
                    self.add_submission(item)?;
                }
                Ok(())
            }
        }
    }

    /// Remove every queued process.
    pub fn clear(&mut self) {
        self.inner.clear();
    }

    /// Whether the pool holds no processes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Number of queued processes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// See [`ProcessPool::splice_by_status`].
    pub fn splice_by_status(
        &mut self,
        status: ProcessStatus,
        limit: Option<usize>,
    ) -> Vec<SharedProcess> {
        self.inner.splice_by_status(status, limit)
    }

    /// Snapshot of the queued processes in admission order.
    #[must_use]
    pub fn snapshot(&self) -> Vec<SharedProcess> {
        self.inner.snapshot()
    }
}
