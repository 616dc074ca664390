//! Configuration for resolutions and batch runs.

use std::time::Duration;

use crate::types::patterns::DataType;

/// Configuration for one interactive resolution.
#[derive(Debug, Clone)]
pub struct ResolveConfig {
    /// Upper bound on navigation decision steps
    pub max_attempts: usize,

    /// Wall-clock budget for the whole resolution
    pub timeout: Duration,

    /// Per-operation budget for navigation and clicks
    pub step_timeout_ms: u64,

    /// Budget for one inference call
    pub inference_timeout_ms: u64,

    /// Which data type's learned patterns steer navigation
    pub data_type: DataType,
}

impl Default for ResolveConfig {
    fn default() -> Self {
        Self {
            max_attempts: 15,
            timeout: Duration::from_secs(90),
            step_timeout_ms: 20_000,
            inference_timeout_ms: 30_000,
            data_type: DataType::Inn,
        }
    }
}

impl ResolveConfig {
    pub fn with_max_attempts(mut self, max_attempts: usize) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_step_timeout_ms(mut self, ms: u64) -> Self {
        self.step_timeout_ms = ms;
        self
    }

    pub fn with_data_type(mut self, data_type: DataType) -> Self {
        self.data_type = data_type;
        self
    }
}

/// Configuration for one batch run.
#[derive(Debug, Clone)]
pub struct BatchConfig {
    /// Maximum simultaneously in-flight resolutions
    pub concurrency_limit: usize,

    /// Added to the per-resolution timeout as a task backstop, so a hung
    /// page cannot hold a concurrency permit forever
    pub task_grace: Duration,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            concurrency_limit: 5,
            task_grace: Duration::from_secs(10),
        }
    }
}

impl BatchConfig {
    pub fn with_concurrency_limit(mut self, limit: usize) -> Self {
        self.concurrency_limit = limit.max(1);
        self
    }
}
