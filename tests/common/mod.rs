//! Shared test fixture: a deterministic fake process.
//!
//! The fake tracks its lifecycle on the wall clock: `Ready` until started,
//! `Running` for a configured duration, then `Terminated`. Output chunks
//! are emitted synchronously from `start`, the way a real process handle
//! may deliver buffered output.

#![allow(dead_code)]

use std::time::{Duration, Instant};

use parallel_process_runner::core::AppResult;
use parallel_process_runner::process::{
    shared, OutputChannel, OutputFn, Process, ProcessId, ProcessStatus, SharedProcess,
};

pub struct FakeProcess {
    id: ProcessId,
    run_for: Duration,
    chunks: Vec<(OutputChannel, Vec<u8>)>,
    started_at: Option<Instant>,
    stopped: bool,
    fail_start: bool,
}

impl FakeProcess {
    /// A process that terminates as soon as it is started.
    pub fn instant() -> Self {
        Self::running_for(Duration::ZERO)
    }

    /// A process that stays running for `run_for` after being started.
    pub fn running_for(run_for: Duration) -> Self {
        Self {
            id: ProcessId::new(),
            run_for,
            chunks: Vec::new(),
            started_at: None,
            stopped: false,
            fail_start: false,
        }
    }

    /// A process that is already terminated and can never be admitted.
    pub fn terminated() -> Self {
        let mut process = Self::instant();
        process.started_at = Some(Instant::now());
        process.stopped = true;
        process
    }

    /// A process whose start operation reports a spawn failure.
    pub fn failing() -> Self {
        let mut process = Self::instant();
        process.fail_start = true;
        process
    }

    /// Queue a chunk to emit when the process is started.
    pub fn with_chunk(mut self, channel: OutputChannel, chunk: &[u8]) -> Self {
        self.chunks.push((channel, chunk.to_vec()));
        self
    }
}

impl Process for FakeProcess {
    fn id(&self) -> ProcessId {
        self.id
    }

    fn status(&self) -> ProcessStatus {
        if self.stopped {
            return ProcessStatus::Terminated;
        }
        match self.started_at {
            None => ProcessStatus::Ready,
            Some(started) if started.elapsed() >= self.run_for => ProcessStatus::Terminated,
            Some(_) => ProcessStatus::Running,
        }
    }

    fn start(&mut self, mut on_output: OutputFn) -> AppResult<()> {
        if self.fail_start {
            return Err(std::io::Error::other("refused to start").into());
        }
        self.started_at = Some(Instant::now());
        for (channel, chunk) in &self.chunks {
            on_output(*channel, chunk);
        }
        Ok(())
    }

    fn stop(&mut self, _grace: Duration) -> AppResult<()> {
        if self.started_at.is_some() {
            self.stopped = true;
        }
        Ok(())
    }
}

/// Wrap a fake into a shared handle, returning its identity alongside.
pub fn spawn_fake(process: FakeProcess) -> (SharedProcess, ProcessId) {
    let id = process.id();
    (shared(process), id)
}

/// Identities of a pool snapshot, in order.
pub fn ids_of(processes: &[SharedProcess]) -> Vec<ProcessId> {
    processes.iter().map(|p| p.lock().id()).collect()
}
