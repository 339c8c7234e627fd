//! Job executor: dispatches jobs to registered handlers.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::info;

use integrahub_core::error::AppError;
use integrahub_entity::job::Job;

/// A handler for one or more job types.
#[async_trait]
pub trait JobHandler: Send + Sync + std::fmt::Debug {
    /// Job types this handler processes.
    fn job_types(&self) -> &[&'static str];

    /// Execute the job with its payload.
    async fn execute(&self, job: &Job) -> Result<Option<Value>, JobExecutionError>;
}

/// Error from job execution.
#[derive(Debug, thiserror::Error)]
pub enum JobExecutionError {
    /// Permanent failure; do not retry.
    #[error("Permanent job failure: {0}")]
    Permanent(String),

    /// Transient failure; may retry.
    #[error("Transient job failure: {0}")]
    Transient(String),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(#[from] AppError),
}

impl JobExecutionError {
    /// Whether another attempt may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transient(_))
    }

    /// A payload that does not deserialize into `T`.
    pub fn invalid_payload<T>(err: serde_json::Error) -> Self {
        Self::Permanent(format!(
            "Invalid {} payload: {err}",
            std::any::type_name::<T>()
                .rsplit("::")
                .next()
                .unwrap_or_default()
        ))
    }
}

impl From<JobExecutionError> for AppError {
    fn from(err: JobExecutionError) -> Self {
        match err {
            JobExecutionError::Internal(inner) => inner,
            JobExecutionError::Transient(message) => AppError::service_unavailable(message),
            JobExecutionError::Permanent(message) => AppError::internal(message),
        }
    }
}

/// Dispatches jobs to the handler registered for their type.
#[derive(Debug, Default)]
pub struct JobExecutor {
    handlers: HashMap<String, Arc<dyn JobHandler>>,
}

impl JobExecutor {
    /// Create an executor with no handlers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler under each of its job types.
    pub fn register(&mut self, handler: Arc<dyn JobHandler>) {
        for job_type in handler.job_types() {
            info!(job_type, "Registered job handler");
            self.handlers
                .insert((*job_type).to_string(), Arc::clone(&handler));
        }
    }

    /// Execute a job by dispatching to its handler.
    pub async fn execute(&self, job: &Job) -> Result<Option<Value>, JobExecutionError> {
        let handler = self.handlers.get(&job.job_type).ok_or_else(|| {
            JobExecutionError::Permanent(format!(
                "No handler registered for job type '{}'",
                job.job_type
            ))
        })?;

        info!(
            job_id = %job.id,
            job_type = %job.job_type,
            attempt = job.attempts,
            max_attempts = job.max_attempts,
            "Executing job"
        );
        handler.execute(job).await
    }

    /// Whether a handler is registered for `job_type`.
    pub fn has_handler(&self, job_type: &str) -> bool {
        self.handlers.contains_key(job_type)
    }

    /// Registered job types.
    pub fn registered_types(&self) -> Vec<String> {
        let mut types: Vec<String> = self.handlers.keys().cloned().collect();
        types.sort();
        types
    }
}
