//! Core scheduling: pools, admission and the run loop.

pub mod error;
pub mod pool;
pub mod runner;
pub mod wait_pool;

pub use error::{AppResult, PoolError};
pub use pool::ProcessPool;
pub use runner::{ParallelRunner, StopHandle};
pub use wait_pool::{Submission, WaitPool};
