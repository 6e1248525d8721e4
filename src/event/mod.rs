//! Synchronous lifecycle event bus.
//!
//! The runner publishes three kinds of notifications: before a process is
//! started, after it has settled into the done pool, and for every output
//! chunk a running process produces. Dispatch is synchronous: `publish`
//! returns only after every registered listener has run. The listener list
//! is snapshotted before dispatch, so a listener may re-entrantly publish,
//! subscribe, or stop the runner that is notifying it.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::process::{OutputChannel, ProcessId, SharedProcess};

/// The lifecycle notifications the runner emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventType {
    /// Published immediately before a process is started.
    BeforeStart,
    /// Published after a process has settled into the done pool.
    AfterStop,
    /// Published for each output chunk a process produces.
    Output,
}

impl EventType {
    /// Dotted event name, usable as a subscription key in logs and tools.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::BeforeStart => "process.start.before",
            Self::AfterStop => "process.stop.after",
            Self::Output => "process.out",
        }
    }
}

/// Payload delivered to listeners.
///
/// Every variant carries the process identity alongside the shared handle:
/// output events can be dispatched while the runner still holds the handle
/// locked, so listeners identify the unit through `id` without locking.
#[derive(Clone)]
pub enum RunnerEvent {
    /// A process is about to be started.
    BeforeStart {
        /// Identity of the process.
        id: ProcessId,
        /// Handle to the process.
        process: SharedProcess,
    },
    /// A process has settled into the done pool.
    AfterStop {
        /// Identity of the process.
        id: ProcessId,
        /// Handle to the process.
        process: SharedProcess,
    },
    /// A process produced an output chunk.
    Output {
        /// Identity of the process.
        id: ProcessId,
        /// Handle to the process.
        process: SharedProcess,
        /// Stream the chunk was produced on.
        channel: OutputChannel,
        /// The raw chunk, uninterpreted.
        chunk: Vec<u8>,
    },
}

impl RunnerEvent {
    /// The event type this payload belongs to.
    #[must_use]
    pub const fn event_type(&self) -> EventType {
        match self {
            Self::BeforeStart { .. } => EventType::BeforeStart,
            Self::AfterStop { .. } => EventType::AfterStop,
            Self::Output { .. } => EventType::Output,
        }
    }

    /// Identity of the process the event concerns.
    #[must_use]
    pub const fn id(&self) -> ProcessId {
        match self {
            Self::BeforeStart { id, .. } | Self::AfterStop { id, .. } | Self::Output { id, .. } => {
                *id
            }
        }
    }

    /// Handle to the process the event concerns.
    #[must_use]
    pub const fn process(&self) -> &SharedProcess {
        match self {
            Self::BeforeStart { process, .. }
            | Self::AfterStop { process, .. }
            | Self::Output { process, .. } => process,
        }
    }
}

impl fmt::Debug for RunnerEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut dbg = f.debug_struct("RunnerEvent");
        dbg.field("type", &self.event_type().name())
            .field("id", &self.id());
        if let Self::Output { channel, chunk, .. } = self {
            dbg.field("channel", &channel.as_str())
                .field("bytes", &chunk.len());
        }
        dbg.finish()
    }
}

type Listener = Arc<dyn Fn(&RunnerEvent) + Send + Sync>;

/// Publish/subscribe registry keyed by [`EventType`].
///
/// Cloning yields another handle onto the same registry, so the bus can be
/// shared between a runner and the code observing it.
#[derive(Clone, Default)]
pub struct EventBus {
    listeners: Arc<RwLock<HashMap<EventType, Vec<Listener>>>>,
}

impl EventBus {
    /// Create an empty bus.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener for one event type.
    pub fn subscribe<F>(&self, event: EventType, listener: F)
    where
        F: Fn(&RunnerEvent) + Send + Sync + 'static,
    {
        self.listeners
            .write()
            .entry(event)
            .or_default()
            .push(Arc::new(listener));
    }

    /// Dispatch an event to every listener registered for its type.
    ///
    /// Listeners run to completion, in registration order, before this call
    /// returns. The registry lock is released before any listener runs.
    pub fn publish(&self, event: &RunnerEvent) {
        let snapshot: Vec<Listener> = self
            .listeners
            .read()
            .get(&event.event_type())
            .cloned()
            .unwrap_or_default();
        if snapshot.is_empty() {
            return;
        }
        tracing::trace!(event = event.event_type().name(), id = %event.id(), listeners = snapshot.len(), "dispatching");
        for listener in snapshot {
            listener(event);
        }
    }
}
