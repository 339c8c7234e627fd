//! Hand-off of long-running work to the background worker.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::result::AppResult;
use crate::types::JobId;

/// A unit of work to run off the request path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRequest {
    /// Handler key, e.g. `"dropbox_backup"`.
    pub job_type: String,
    /// Queue name: `critical`, `default`, or `long`.
    pub queue: String,
    /// Handler input.
    pub payload: serde_json::Value,
    /// Per-job timeout; `None` uses the worker default.
    pub timeout_seconds: Option<u64>,
}

impl JobRequest {
    /// Creates a request on the `default` queue.
    pub fn new(job_type: impl Into<String>, payload: serde_json::Value) -> Self {
        Self {
            job_type: job_type.into(),
            queue: "default".to_string(),
            payload,
            timeout_seconds: None,
        }
    }

    /// Routes the job to another queue.
    pub fn on_queue(mut self, queue: impl Into<String>) -> Self {
        self.queue = queue.into();
        self
    }

    /// Sets the per-job timeout.
    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.timeout_seconds = Some(seconds);
        self
    }
}

/// Accepts jobs for asynchronous execution.
#[async_trait]
pub trait JobEnqueuer: Send + Sync + std::fmt::Debug + 'static {
    /// Enqueue a job and return its identifier.
    async fn enqueue(&self, request: JobRequest) -> AppResult<JobId>;
}
