//! Insertion-ordered process pool keyed by identity.

use indexmap::IndexMap;

use crate::core::error::PoolError;
use crate::process::{ProcessId, ProcessStatus, SharedProcess};

/// An unordered collection of processes keyed by identity, preserving
/// insertion order for iteration and extraction.
///
/// A given identity occurs in at most one pool of a runner at any time;
/// the runner moves handles between its waiting, active and done pools
/// through [`ProcessPool::splice_by_status`] and [`ProcessPool::add`].
#[derive(Default)]
pub struct ProcessPool {
    entries: IndexMap<ProcessId, SharedProcess>,
}

impl ProcessPool {
    /// Create an empty pool.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a process at the end of the iteration order.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::AlreadyInPool`] if a process with the same
    /// identity is already present; the pool is left untouched.
    pub fn add(&mut self, process: SharedProcess) -> Result<(), PoolError> {
        let id = process.lock().id();
        if self.entries.contains_key(&id) {
            return Err(PoolError::AlreadyInPool { id, process });
        }
        self.entries.insert(id, process);
        Ok(())
    }

    /// Remove every process. External process state is not touched.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Whether the pool holds no processes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of processes currently held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Remove and return up to `limit` processes whose status equals
    /// `status`, scanning in insertion order.
    ///
    /// Relative order is preserved both among the returned processes and
    /// among the ones left behind. `None` means no limit. Matching ids are
    /// collected before anything is removed, so a re-entrant observer never
    /// sees a half-drained scan.
    pub fn splice_by_status(
        &mut self,
        status: ProcessStatus,
        limit: Option<usize>,
    ) -> Vec<SharedProcess> {
        let limit = limit.unwrap_or_else(|| self.entries.len());
        if limit == 0 {
            return Vec::new();
        }
        let matched: Vec<ProcessId> = self
            .entries
            .iter()
            .filter(|(_, process)| process.lock().status() == status)
            .map(|(id, _)| *id)
            .take(limit)
            .collect();
        matched
            .iter()
            // shift_remove keeps the relative order of the remaining entries
            .filter_map(|id| self.entries.shift_remove(id))
            .collect()
    }

    /// Snapshot of the current members in insertion order.
    #[must_use]
    pub fn snapshot(&self) -> Vec<SharedProcess> {
        self.entries.values().cloned().collect()
    }

    /// Consume the pool, yielding its members in insertion order.
    #[must_use]
    pub fn into_processes(self) -> Vec<SharedProcess> {
        self.entries.into_values().collect()
    }
}
