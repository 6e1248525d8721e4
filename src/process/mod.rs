//! External process abstraction consumed by the scheduler.
//!
//! The runner never spawns, pipes, or signals operating-system processes
//! itself. It drives values implementing [`Process`]: a handle with an
//! identity, a three-state lifecycle status, a non-blocking start operation
//! and a blocking stop operation. Anything satisfying that contract can be
//! scheduled, which keeps process construction (and exit-code
//! interpretation) entirely on the caller's side.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::AppResult;

/// Opaque process identity used as the pool key.
///
/// Identity equality, not value equality: two handles compare equal exactly
/// when they refer to the same scheduled unit.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProcessId(Uuid);

impl ProcessId {
    /// Generate a fresh identity.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ProcessId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ProcessId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ProcessId({})", self.0)
    }
}

impl fmt::Display for ProcessId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Lifecycle status reported by a process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessStatus {
    /// Not started yet.
    Ready,
    /// Started and still executing.
    Running,
    /// Finished, whether successfully or not.
    Terminated,
}

/// Which output stream a chunk was produced on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputChannel {
    /// Standard output.
    Stdout,
    /// Standard error.
    Stderr,
}

impl OutputChannel {
    /// Stable string form, usable as a log field.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Stdout => "stdout",
            Self::Stderr => "stderr",
        }
    }
}

/// Callback receiving output chunks as the process produces them.
pub type OutputFn = Box<dyn FnMut(OutputChannel, &[u8]) + Send>;

/// One externally executing piece of work.
///
/// Implementations own all operating-system interaction. The scheduler only
/// reads [`Process::status`] and calls [`Process::start`] /
/// [`Process::stop`]; it never interprets output or exit state.
pub trait Process: Send {
    /// Identity used to key this process inside the pools.
    fn id(&self) -> ProcessId;

    /// Current lifecycle status.
    fn status(&self) -> ProcessStatus;

    /// Begin execution without blocking.
    ///
    /// `on_output` receives every chunk the process produces, tagged with
    /// its channel. It may be invoked synchronously from within this call,
    /// while the scheduler still holds the process handle locked; observers
    /// of the resulting output events must not lock the handle themselves
    /// during dispatch.
    fn start(&mut self, on_output: OutputFn) -> AppResult<()>;

    /// Stop execution, blocking until terminated or `grace` elapses.
    fn stop(&mut self, grace: Duration) -> AppResult<()>;
}

/// Shared, lockable process handle as stored in the pools.
pub type SharedProcess = Arc<Mutex<dyn Process>>;

/// Wrap a concrete process into a [`SharedProcess`] handle.
pub fn shared<P: Process + 'static>(process: P) -> SharedProcess {
    Arc::new(Mutex::new(process))
}
