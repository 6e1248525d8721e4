//! # Parallel Process Runner
//!
//! A bounded-concurrency scheduler for external processes.
//!
//! This library runs a collection of independently spawned units of work
//! under a configurable parallelism ceiling, tracking each one through
//! three ownership pools (waiting, active, done) and publishing lifecycle
//! notifications to observers. It is an admission-controlled, pollable
//! runner for callers with many long- or short-running external commands
//! who want neither "start them all at once" nor "one at a time by hand".
//!
//! ## Core Model
//!
//! - **Three pools**: submitted processes queue in `waiting`, run in
//!   `active` (never more than the ceiling at once), and land in `done`
//!   in completion order.
//! - **Polling run loop**: each iteration settles finished processes,
//!   admits ready ones up to free capacity and sleeps for the poll
//!   interval while anything is still active.
//! - **Synchronous events**: before-start, after-stop and output-chunk
//!   notifications fire on an [`event::EventBus`]; listeners run to
//!   completion before the publishing call returns and may re-entrantly
//!   stop the runner.
//! - **External processes**: the [`process::Process`] trait is consumed,
//!   not implemented, here. The scheduler only reads a three-valued status
//!   and calls start/stop; spawning, piping and exit-code interpretation
//!   stay with the caller.
//!
//! ## Example
//!
//! ```rust,ignore
//! use parallel_process_runner::config::RunnerConfig;
//! use parallel_process_runner::core::ParallelRunner;
//! use parallel_process_runner::event::EventType;
//! use parallel_process_runner::process::shared;
//!
//! let runner = ParallelRunner::with_config(
//!     RunnerConfig::new().with_max_parallel(4),
//! )?;
//!
//! runner.bus().subscribe(EventType::AfterStop, |event| {
//!     println!("finished: {}", event.id());
//! });
//!
//! runner.submit(vec![shared(job_a), shared(job_b)])?;
//! let done = runner.run()?;
//! ```
//!
//! Cancellation goes through [`core::StopHandle`], which is clonable and
//! usable from listeners or other threads; a stop is observed within one
//! poll interval. Dropping a runner stops whatever is still active.
//!
//! With the `tokio-runtime` feature (default), `run_async` drives the same
//! loop with a non-blocking sleep.

#![deny(warnings)]
#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Core scheduling: pools, admission and the run loop.
pub mod core;
/// Runner configuration.
pub mod config;
/// Synchronous lifecycle event bus.
pub mod event;
/// External process abstraction consumed by the scheduler.
pub mod process;
/// Shared utilities.
pub mod util;
