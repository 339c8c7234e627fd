//! Background worker configuration.

use serde::{Deserialize, Serialize};

/// Background job worker configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Whether the worker is enabled.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Number of concurrent job processing tasks.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    /// Interval in seconds between job queue polls.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_seconds: u64,
    /// Timeout applied to jobs that do not carry their own.
    #[serde(default = "default_job_timeout")]
    pub default_timeout_seconds: u64,
    /// Queues polled by the runner, in priority order.
    #[serde(default = "default_queues")]
    pub queues: Vec<String>,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            concurrency: default_concurrency(),
            poll_interval_seconds: default_poll_interval(),
            default_timeout_seconds: default_job_timeout(),
            queues: default_queues(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_concurrency() -> usize {
    4
}

fn default_poll_interval() -> u64 {
    5
}

fn default_job_timeout() -> u64 {
    300
}

fn default_queues() -> Vec<String> {
    vec![
        "critical".to_string(),
        "default".to_string(),
        "long".to_string(),
    ]
}
