//! Runner configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Scheduling parameters for a runner.
///
/// Both values are also mutable on a live runner between loop iterations;
/// this struct carries the initial settings and the serialized form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunnerConfig {
    /// Ceiling on concurrently active processes. Must be positive.
    pub max_parallel: usize,
    /// Sleep between status checks while anything is active, in
    /// microseconds. Zero polls without sleeping.
    pub poll_interval_us: u64,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            max_parallel: 1,
            poll_interval_us: 1_000,
        }
    }
}

impl RunnerConfig {
    /// Default configuration: one process at a time, 1ms poll interval.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the parallelism ceiling.
    #[must_use]
    pub const fn with_max_parallel(mut self, max_parallel: usize) -> Self {
        self.max_parallel = max_parallel;
        self
    }

    /// Size the ceiling to the number of logical CPUs.
    #[must_use]
    pub fn with_auto_parallelism(mut self) -> Self {
        self.max_parallel = num_cpus::get();
        self
    }

    /// Set the poll interval. Sub-microsecond durations truncate to zero.
    #[must_use]
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval_us = u64::try_from(interval.as_micros()).unwrap_or(u64::MAX);
        self
    }

    /// The poll interval as a duration.
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_micros(self.poll_interval_us)
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns a description of the first invalid value.
    pub fn validate(&self) -> Result<(), String> {
        if self.max_parallel == 0 {
            return Err("max_parallel must be greater than 0".into());
        }
        Ok(())
    }

    /// Parse a configuration from a JSON string and validate it.
    ///
    /// # Errors
    ///
    /// Returns a description of the parse or validation failure.
    pub fn from_json_str(input: &str) -> Result<Self, String> {
        let cfg: Self = serde_json::from_str(input).map_err(|e| format!("parse error: {e}"))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Load overrides from the environment (and a `.env` file if present),
    /// falling back to defaults.
    ///
    /// Recognized keys: `RUNNER_MAX_PARALLEL`, `RUNNER_POLL_INTERVAL_US`.
    ///
    /// # Errors
    ///
    /// Returns a description of the first unparsable or invalid value.
    pub fn from_env() -> Result<Self, String> {
        dotenvy::dotenv().ok();
        let mut cfg = Self::default();
        if let Ok(raw) = std::env::var("RUNNER_MAX_PARALLEL") {
            cfg.max_parallel = raw
                .parse()
                .map_err(|e| format!("RUNNER_MAX_PARALLEL: {e}"))?;
        }
        if let Ok(raw) = std::env::var("RUNNER_POLL_INTERVAL_US") {
            cfg.poll_interval_us = raw
                .parse()
                .map_err(|e| format!("RUNNER_POLL_INTERVAL_US: {e}"))?;
        }
        cfg.validate()?;
        Ok(cfg)
    }
}
