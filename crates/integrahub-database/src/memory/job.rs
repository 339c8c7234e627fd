//! In-memory job queue.

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use tokio::sync::Mutex;
use uuid::Uuid;

use integrahub_core::error::AppError;
use integrahub_core::result::AppResult;
use integrahub_entity::job::{CreateJob, Job, JobStatus};

use crate::store::JobStore;

/// Job store kept in insertion order.
#[derive(Debug, Default)]
pub struct MemoryJobStore {
    jobs: Mutex<Vec<Job>>,
}

impl MemoryJobStore {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Every job ever created, oldest first.
    pub async fn all(&self) -> Vec<Job> {
        self.jobs.lock().await.clone()
    }

    async fn update<F>(&self, id: Uuid, apply: F) -> AppResult<()>
    where
        F: FnOnce(&mut Job) + Send,
    {
        let mut jobs = self.jobs.lock().await;
        let job = jobs
            .iter_mut()
            .find(|j| j.id == id)
            .ok_or_else(|| AppError::not_found(format!("Job {id} not found")))?;
        apply(job);
        job.updated_at = Utc::now();
        Ok(())
    }
}

#[async_trait]
impl JobStore for MemoryJobStore {
    async fn create(&self, data: CreateJob) -> AppResult<Job> {
        let job = data.into_job(Utc::now());
        self.jobs.lock().await.push(job.clone());
        Ok(job)
    }

    async fn find(&self, id: Uuid) -> AppResult<Option<Job>> {
        Ok(self.jobs.lock().await.iter().find(|j| j.id == id).cloned())
    }

    async fn dequeue(&self, queue: &str, worker_id: &str) -> AppResult<Option<Job>> {
        let mut jobs = self.jobs.lock().await;
        let Some(job) = jobs
            .iter_mut()
            .find(|j| j.queue == queue && j.status == JobStatus::Pending)
        else {
            return Ok(None);
        };
        let now = Utc::now();
        job.status = JobStatus::Running;
        job.attempts += 1;
        job.started_at = Some(now);
        job.worker_id = Some(worker_id.to_string());
        job.updated_at = now;
        Ok(Some(job.clone()))
    }

    async fn complete(&self, id: Uuid, result: Option<Value>) -> AppResult<()> {
        self.update(id, |job| {
            job.status = JobStatus::Completed;
            job.result = result;
            job.completed_at = Some(Utc::now());
        })
        .await
    }

    async fn fail(&self, id: Uuid, error_message: &str) -> AppResult<()> {
        let error_message = error_message.to_string();
        self.update(id, |job| {
            job.status = JobStatus::Failed;
            job.error_message = Some(error_message);
            job.completed_at = Some(Utc::now());
        })
        .await
    }

    async fn retry(&self, id: Uuid, error_message: &str) -> AppResult<()> {
        let error_message = error_message.to_string();
        self.update(id, |job| {
            job.status = JobStatus::Pending;
            job.error_message = Some(error_message);
            job.started_at = None;
            job.worker_id = None;
        })
        .await
    }
}
