//! Error types for pool and admission operations.

use std::fmt;

use thiserror::Error;

use crate::process::{ProcessId, ProcessStatus, SharedProcess};

/// Errors produced when inserting processes into scheduler pools.
///
/// Both variants carry the offending handle so the caller can inspect the
/// process that was refused. They are raised synchronously at submission
/// time and never retried internally.
#[derive(Error)]
pub enum PoolError {
    /// A process with the same identity is already tracked.
    #[error("process {id} is already tracked")]
    AlreadyInPool {
        /// Identity that collided.
        id: ProcessId,
        /// The refused handle.
        process: SharedProcess,
    },
    /// A process was submitted while not in the ready state.
    #[error("process {id} is not ready (status {status:?})")]
    NotReady {
        /// Identity of the refused process.
        id: ProcessId,
        /// Status observed at admission time.
        status: ProcessStatus,
        /// The refused handle.
        process: SharedProcess,
    },
}

impl PoolError {
    /// Identity of the process the error concerns.
    #[must_use]
    pub const fn id(&self) -> ProcessId {
        match self {
            Self::AlreadyInPool { id, .. } | Self::NotReady { id, .. } => *id,
        }
    }

    /// Handle to the refused process.
    #[must_use]
    pub const fn process(&self) -> &SharedProcess {
        match self {
            Self::AlreadyInPool { process, .. } | Self::NotReady { process, .. } => process,
        }
    }
}

impl fmt::Debug for PoolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlreadyInPool { id, .. } => f
                .debug_struct("AlreadyInPool")
                .field("id", id)
                .finish_non_exhaustive(),
            Self::NotReady { id, status, .. } => f
                .debug_struct("NotReady")
                .field("id", id)
                .field("status", status)
                .finish_non_exhaustive(),
        }
    }
}

/// Application-facing result using anyhow for higher-level contexts.
pub type AppResult<T> = Result<T, anyhow::Error>;
