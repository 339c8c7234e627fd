//! Job queue over the durable job store.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

use integrahub_core::error::AppError;
use integrahub_core::result::AppResult;
use integrahub_core::traits::{JobEnqueuer, JobRequest};
use integrahub_core::types::JobId;
use integrahub_database::JobStore;
use integrahub_entity::job::{CreateJob, Job};

/// Attempts a job gets unless the queue is built with another limit.
pub const DEFAULT_MAX_ATTEMPTS: i32 = 3;

/// Job queue for enqueuing and claiming work.
#[derive(Debug, Clone)]
pub struct JobQueue {
    /// Durable job rows.
    store: Arc<dyn JobStore>,
    /// Worker identifier recorded on claimed jobs.
    worker_id: String,
    /// Attempts given to every new job.
    max_attempts: i32,
}

impl JobQueue {
    /// Create a new job queue.
    pub fn new(store: Arc<dyn JobStore>, worker_id: impl Into<String>) -> Self {
        Self {
            store,
            worker_id: worker_id.into(),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }

    /// Override the attempts given to new jobs.
    pub fn with_max_attempts(mut self, max_attempts: i32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    /// Identifier of the worker claiming jobs through this queue.
    pub fn worker_id(&self) -> &str {
        &self.worker_id
    }

    /// Claim the next pending job, trying `queues` in order.
    pub async fn dequeue(&self, queues: &[String]) -> AppResult<Option<Job>> {
        for queue in queues {
            if let Some(job) = self.store.dequeue(queue, &self.worker_id).await? {
                debug!(
                    job_id = %job.id,
                    job_type = %job.job_type,
                    queue = %job.queue,
                    attempt = job.attempts,
                    "Dequeued job"
                );
                return Ok(Some(job));
            }
        }
        Ok(None)
    }

    /// Mark a job as completed.
    pub async fn complete(&self, job_id: Uuid, result: Option<Value>) -> AppResult<()> {
        self.store.complete(job_id, result).await?;
        debug!(%job_id, "Job completed");
        Ok(())
    }

    /// Mark a job as failed for good.
    pub async fn fail(&self, job_id: Uuid, error: &str) -> AppResult<()> {
        self.store.fail(job_id, error).await?;
        debug!(%job_id, error, "Job failed");
        Ok(())
    }

    /// Put a job back for another attempt.
    pub async fn retry(&self, job_id: Uuid, error: &str) -> AppResult<()> {
        self.store.retry(job_id, error).await?;
        debug!(%job_id, error, "Job requeued");
        Ok(())
    }
}

#[async_trait]
impl JobEnqueuer for JobQueue {
    async fn enqueue(&self, request: JobRequest) -> AppResult<JobId> {
        let timeout_seconds = request
            .timeout_seconds
            .map(i32::try_from)
            .transpose()
            .map_err(|_| AppError::validation("Job timeout is too large"))?;
        let job = self
            .store
            .create(CreateJob {
                job_type: request.job_type,
                queue: request.queue,
                payload: request.payload,
                max_attempts: self.max_attempts,
                timeout_seconds,
            })
            .await?;

        debug!(
            job_id = %job.id,
            job_type = %job.job_type,
            queue = %job.queue,
            "Enqueued job"
        );
        Ok(JobId::from_uuid(job.id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use integrahub_database::memory::MemoryJobStore;
    use integrahub_entity::job::JobStatus;
    use serde_json::json;

    #[tokio::test]
    async fn test_enqueue_persists_request() {
        let store = Arc::new(MemoryJobStore::new());
        let queue = JobQueue::new(store.clone(), "worker-1").with_max_attempts(2);

        let id = queue
            .enqueue(
                JobRequest::new("dropbox_backup", json!({}))
                    .on_queue("long")
                    .with_timeout(1500),
            )
            .await
            .unwrap();

        let job = store.find(id.into_uuid()).await.unwrap().unwrap();
        assert_eq!(job.queue, "long");
        assert_eq!(job.status, JobStatus::Pending);
        assert_eq!(job.max_attempts, 2);
        assert_eq!(job.timeout_seconds, Some(1500));
    }

    #[tokio::test]
    async fn test_dequeue_prefers_earlier_queues() {
        let store = Arc::new(MemoryJobStore::new());
        let queue = JobQueue::new(store, "worker-1");
        queue
            .enqueue(JobRequest::new("webhook_delivery", json!({})))
            .await
            .unwrap();
        queue
            .enqueue(JobRequest::new("payment_capture", json!({})).on_queue("critical"))
            .await
            .unwrap();

        let order = ["critical".to_string(), "default".to_string()];
        let first = queue.dequeue(&order).await.unwrap().unwrap();
        let second = queue.dequeue(&order).await.unwrap().unwrap();

        assert_eq!(first.job_type, "payment_capture");
        assert_eq!(second.job_type, "webhook_delivery");
        assert_eq!(second.worker_id.as_deref(), Some("worker-1"));
        assert!(queue.dequeue(&order).await.unwrap().is_none());
    }
}
