//! The poll-driven scheduler moving processes between pools.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use crate::config::RunnerConfig;
use crate::core::error::{AppResult, PoolError};
use crate::core::pool::ProcessPool;
use crate::core::wait_pool::{Submission, WaitPool};
use crate::event::{EventBus, RunnerEvent};
use crate::process::{ProcessStatus, SharedProcess};

/// The three ownership pools, guarded as one unit.
struct Pools {
    wait: WaitPool,
    active: ProcessPool,
    done: ProcessPool,
}

/// State shared between a runner, its stop handles and its listeners.
struct RunnerShared {
    pools: Mutex<Pools>,
    bus: EventBus,
    max_parallel: AtomicUsize,
    poll_interval_us: AtomicU64,
}

impl RunnerShared {
    fn poll_interval(&self) -> Duration {
        Duration::from_micros(self.poll_interval_us.load(Ordering::Relaxed))
    }

    /// Move every finished process from the active pool into the done pool,
    /// publishing an after-stop event per process.
    ///
    /// Harvests anything that is no longer running: a process that never
    /// left the ready state would otherwise sit in the active pool forever.
    /// Events fire with no pool lock held, so a listener may call back into
    /// the runner.
    fn settle(&self) -> AppResult<()> {
        let finished = {
            let mut pools = self.pools.lock();
            let mut harvested = pools.active.splice_by_status(ProcessStatus::Ready, None);
            harvested.extend(pools.active.splice_by_status(ProcessStatus::Terminated, None));
            harvested
        };
        for process in finished {
            let id = process.lock().id();
            self.pools.lock().done.add(Arc::clone(&process))?;
            tracing::debug!(%id, "process settled");
            self.bus.publish(&RunnerEvent::AfterStop { id, process });
        }
        Ok(())
    }

    /// Admit ready processes from the wait pool into the active pool up to
    /// the free capacity, starting each one.
    fn admit(&self) -> AppResult<()> {
        let admitted = {
            let mut pools = self.pools.lock();
            let free = self
                .max_parallel
                .load(Ordering::Relaxed)
                .saturating_sub(pools.active.len());
            pools.wait.splice_by_status(ProcessStatus::Ready, Some(free))
        };
        for process in admitted {
            let id = process.lock().id();
            self.pools.lock().active.add(Arc::clone(&process))?;
            self.bus.publish(&RunnerEvent::BeforeStart {
                id,
                process: Arc::clone(&process),
            });

            let bus = self.bus.clone();
            let handle = Arc::clone(&process);
            tracing::debug!(%id, "starting process");
            process.lock().start(Box::new(move |channel, chunk| {
                bus.publish(&RunnerEvent::Output {
                    id,
                    process: Arc::clone(&handle),
                    channel,
                    chunk: chunk.to_vec(),
                });
            }))?;
        }
        Ok(())
    }

    /// Abandon waiting processes, force-stop active ones and settle them.
    fn stop_all(&self) -> AppResult<()> {
        let active = {
            let mut pools = self.pools.lock();
            // abandoned processes never start and never produce events
            pools.wait.clear();
            pools.active.snapshot()
        };
        if !active.is_empty() {
            tracing::debug!(count = active.len(), "force-stopping active processes");
        }
        for process in &active {
            process.lock().stop(Duration::ZERO)?;
        }
        self.settle()
    }

    fn active_is_empty(&self) -> bool {
        self.pools.lock().active.is_empty()
    }
}

/// Cancellation handle usable from event listeners and other threads.
///
/// Obtained from [`ParallelRunner::stop_handle`]. Cloning is cheap; every
/// clone stops the same runner.
#[derive(Clone)]
pub struct StopHandle {
    shared: Arc<RunnerShared>,
}

impl StopHandle {
    /// See [`ParallelRunner::stop`].
    ///
    /// # Errors
    ///
    /// Propagates the first failure reported by a process stop operation.
    pub fn stop(&self) -> AppResult<()> {
        self.shared.stop_all()
    }
}

/// Bounded-concurrency scheduler for external processes.
///
/// Processes are submitted into a waiting pool, admitted into an active
/// pool up to the parallelism ceiling, and harvested into a done pool once
/// they are no longer running. [`ParallelRunner::run`] drives the loop and
/// returns the done pool in completion order. Lifecycle notifications are
/// published on the runner's [`EventBus`].
///
/// Dropping the runner stops whatever is still active, so a runner that
/// goes out of scope on any path (return, error, panic unwind) does not
/// leak running processes.
pub struct ParallelRunner {
    shared: Arc<RunnerShared>,
}

impl ParallelRunner {
    /// Create a runner with default configuration and a fresh event bus.
    #[must_use]
    pub fn new() -> Self {
        // the default configuration is always valid
        Self::build(RunnerConfig::default(), EventBus::new())
    }

    /// Create a runner from a validated configuration.
    ///
    /// # Errors
    ///
    /// Fails when `config` does not pass [`RunnerConfig::validate`].
    pub fn with_config(config: RunnerConfig) -> AppResult<Self> {
        Self::with_bus(config, EventBus::new())
    }

    /// Create a runner publishing on an existing bus.
    ///
    /// # Errors
    ///
    /// Fails when `config` does not pass [`RunnerConfig::validate`].
    pub fn with_bus(config: RunnerConfig, bus: EventBus) -> AppResult<Self> {
        config
            .validate()
            .map_err(|e| anyhow::anyhow!("invalid runner config: {e}"))?;
        Ok(Self::build(config, bus))
    }

    fn build(config: RunnerConfig, bus: EventBus) -> Self {
        Self {
            shared: Arc::new(RunnerShared {
                pools: Mutex::new(Pools {
                    wait: WaitPool::new(),
                    active: ProcessPool::new(),
                    done: ProcessPool::new(),
                }),
                bus,
                max_parallel: AtomicUsize::new(config.max_parallel),
                poll_interval_us: AtomicU64::new(config.poll_interval_us),
            }),
        }
    }

    /// The bus this runner publishes lifecycle events on.
    #[must_use]
    pub fn bus(&self) -> &EventBus {
        &self.shared.bus
    }

    /// A clonable handle that can stop this runner from a listener or
    /// another thread.
    #[must_use]
    pub fn stop_handle(&self) -> StopHandle {
        StopHandle {
            shared: Arc::clone(&self.shared),
        }
    }

    /// Change the parallelism ceiling; effective on the next loop iteration.
    ///
    /// The value is stored unchecked. A ceiling of zero admits nothing, so
    /// a subsequent [`ParallelRunner::run`] returns with waiting processes
    /// untouched.
    pub fn set_max_parallel(&self, max_parallel: usize) {
        self.shared
            .max_parallel
            .store(max_parallel, Ordering::Relaxed);
    }

    /// Change the sleep between status checks; effective on the next loop
    /// iteration. Sub-microsecond durations truncate to no sleep.
    pub fn set_poll_interval(&self, interval: Duration) {
        let micros = u64::try_from(interval.as_micros()).unwrap_or(u64::MAX);
        self.shared
            .poll_interval_us
            .store(micros, Ordering::Relaxed);
    }

    /// Queue one process, a batch, or any nested mixture for execution.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::NotReady`] or [`PoolError::AlreadyInPool`] per
    /// leaf, leaving earlier leaves admitted (see [`WaitPool::add`]).
    pub fn submit(&self, processes: impl Into<Submission>) -> Result<(), PoolError> {
        self.shared.pools.lock().wait.add(processes)
    }

    /// Drive every submitted process to completion and return the done
    /// pool in completion order.
    ///
    /// Each iteration settles finished processes, admits ready ones up to
    /// the ceiling and sleeps for the poll interval while anything is still
    /// active. The call blocks until the active pool drains, either
    /// naturally or through [`ParallelRunner::stop`].
    ///
    /// # Errors
    ///
    /// Propagates the first failure reported by an external start or stop
    /// operation; the loop itself has no failure path.
    pub fn run(&self) -> AppResult<Vec<SharedProcess>> {
        tracing::debug!("run loop started");
        loop {
            self.shared.settle()?;
            self.shared.admit()?;
            if self.shared.active_is_empty() {
                break;
            }
            std::thread::sleep(self.shared.poll_interval());
            // re-check so a stop() issued during the sleep ends the loop
            // within one poll interval
            if self.shared.active_is_empty() {
                break;
            }
        }
        let done = self.shared.pools.lock().done.snapshot();
        tracing::debug!(completed = done.len(), "run loop finished");
        Ok(done)
    }

    /// Async flavor of [`ParallelRunner::run`], identical except that the
    /// throttle sleep yields to the tokio runtime instead of blocking the
    /// thread.
    ///
    /// # Errors
    ///
    /// As [`ParallelRunner::run`].
    #[cfg(feature = "tokio-runtime")]
    pub async fn run_async(&self) -> AppResult<Vec<SharedProcess>> {
        tracing::debug!("run loop started");
        loop {
            self.shared.settle()?;
            self.shared.admit()?;
            if self.shared.active_is_empty() {
                break;
            }
            tokio::time::sleep(self.shared.poll_interval()).await;
            if self.shared.active_is_empty() {
                break;
            }
        }
        let done = self.shared.pools.lock().done.snapshot();
        tracing::debug!(completed = done.len(), "run loop finished");
        Ok(done)
    }

    /// Abandon waiting processes and force-stop active ones.
    ///
    /// Waiting processes are dropped silently: they never start and no
    /// event is published for them. Active processes receive a stop with
    /// zero grace and are then settled into the done pool, firing their
    /// after-stop events. Idempotent, and safe to call from an after-stop
    /// listener fired by the very run loop being stopped.
    ///
    /// # Errors
    ///
    /// Propagates the first failure reported by a process stop operation.
    pub fn stop(&self) -> AppResult<()> {
        self.shared.stop_all()
    }

    /// Empty all three pools unconditionally.
    ///
    /// Processes already started keep running detached; call
    /// [`ParallelRunner::stop`] first when abandoning in-flight work.
    pub fn reset(&self) {
        let mut pools = self.shared.pools.lock();
        if !pools.active.is_empty() {
            tracing::warn!(
                live = pools.active.len(),
                "reset with live processes; they keep running detached"
            );
        }
        pools.wait.clear();
        pools.active.clear();
        pools.done.clear();
    }

    /// Number of processes waiting for admission.
    #[must_use]
    pub fn waiting_count(&self) -> usize {
        self.shared.pools.lock().wait.len()
    }

    /// Number of processes currently admitted.
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.shared.pools.lock().active.len()
    }

    /// Number of processes settled so far.
    #[must_use]
    pub fn done_count(&self) -> usize {
        self.shared.pools.lock().done.len()
    }
}

impl Default for ParallelRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for ParallelRunner {
    fn drop(&mut self) {
        if let Err(error) = self.shared.stop_all() {
            tracing::warn!(%error, "failed to stop processes during drop");
        }
    }
}
