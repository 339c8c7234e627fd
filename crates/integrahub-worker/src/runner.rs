//! Worker runner: the loop that polls the queues and executes jobs.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Semaphore, watch};
use tokio::time;
use tracing::{error, info, trace, warn};

use integrahub_core::config::WorkerConfig;
use integrahub_core::result::AppResult;
use integrahub_entity::job::Job;

use crate::executor::{JobExecutionError, JobExecutor};
use crate::queue::JobQueue;

/// How long shutdown waits for in-flight jobs.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(30);

/// Polls the configured queues and executes claimed jobs.
#[derive(Debug)]
pub struct WorkerRunner {
    queue: Arc<JobQueue>,
    executor: Arc<JobExecutor>,
    config: WorkerConfig,
}

impl WorkerRunner {
    /// Create a new worker runner.
    pub fn new(queue: Arc<JobQueue>, executor: Arc<JobExecutor>, config: WorkerConfig) -> Self {
        Self {
            queue,
            executor,
            config,
        }
    }

    /// Run until the cancel signal flips to `true`.
    pub async fn run(&self, mut cancel: watch::Receiver<bool>) {
        let concurrency = self.config.concurrency.max(1);
        info!(
            worker = %self.queue.worker_id(),
            concurrency,
            poll_interval = self.config.poll_interval_seconds,
            queues = ?self.config.queues,
            "Worker started"
        );

        let semaphore = Arc::new(Semaphore::new(concurrency));
        let poll_interval = Duration::from_secs(self.config.poll_interval_seconds);

        loop {
            tokio::select! {
                _ = cancel.changed() => {
                    if *cancel.borrow() {
                        info!(worker = %self.queue.worker_id(), "Worker received shutdown signal");
                        break;
                    }
                }
                claimed = self.poll_and_spawn(&semaphore) => {
                    if claimed {
                        continue;
                    }
                    tokio::select! {
                        _ = cancel.changed() => {
                            if *cancel.borrow() {
                                info!(worker = %self.queue.worker_id(), "Worker shutting down");
                                break;
                            }
                        }
                        _ = time::sleep(poll_interval) => {}
                    }
                }
            }
        }

        info!(worker = %self.queue.worker_id(), "Waiting for in-flight jobs");
        let permits = u32::try_from(concurrency).unwrap_or(u32::MAX);
        if time::timeout(SHUTDOWN_GRACE, semaphore.acquire_many(permits))
            .await
            .is_err()
        {
            warn!(worker = %self.queue.worker_id(), "In-flight jobs still running at shutdown");
        }
        info!(worker = %self.queue.worker_id(), "Worker shut down");
    }

    /// Claim one job and execute it on the current task.
    ///
    /// Returns `false` when every queue is empty.
    pub async fn run_next(&self) -> AppResult<bool> {
        let Some(job) = self.queue.dequeue(&self.config.queues).await? else {
            return Ok(false);
        };
        process(
            &self.queue,
            &self.executor,
            job,
            self.config.default_timeout_seconds,
        )
        .await;
        Ok(true)
    }

    /// Claim a job if a slot is free and run it on its own task.
    ///
    /// Returns whether a job was claimed.
    async fn poll_and_spawn(&self, semaphore: &Arc<Semaphore>) -> bool {
        let Ok(permit) = Arc::clone(semaphore).try_acquire_owned() else {
            trace!("All worker slots occupied");
            return false;
        };

        match self.queue.dequeue(&self.config.queues).await {
            Ok(Some(job)) => {
                let queue = Arc::clone(&self.queue);
                let executor = Arc::clone(&self.executor);
                let default_timeout = self.config.default_timeout_seconds;
                tokio::spawn(async move {
                    let _permit = permit;
                    process(&queue, &executor, job, default_timeout).await;
                });
                true
            }
            Ok(None) => {
                trace!("No jobs available");
                false
            }
            Err(e) => {
                error!(error = %e, "Failed to dequeue job");
                false
            }
        }
    }
}

/// Execute a claimed job under its timeout and record the outcome.
async fn process(queue: &JobQueue, executor: &JobExecutor, job: Job, default_timeout: u64) {
    let timeout = job
        .timeout_seconds
        .and_then(|s| u64::try_from(s).ok())
        .filter(|s| *s > 0)
        .unwrap_or(default_timeout);

    let outcome = match time::timeout(Duration::from_secs(timeout), executor.execute(&job)).await
    {
        Ok(outcome) => outcome,
        Err(_) => Err(JobExecutionError::Permanent(format!(
            "Job timed out after {timeout}s"
        ))),
    };

    let recorded = match outcome {
        Ok(result) => {
            info!(job_id = %job.id, job_type = %job.job_type, "Job completed");
            queue.complete(job.id, result).await
        }
        Err(e) if e.is_transient() && job.can_retry() => {
            warn!(
                job_id = %job.id,
                attempt = job.attempts,
                max_attempts = job.max_attempts,
                error = %e,
                "Job failed, will retry"
            );
            queue.retry(job.id, &e.to_string()).await
        }
        Err(e) => {
            error!(job_id = %job.id, job_type = %job.job_type, error = %e, "Job failed");
            queue.fail(job.id, &e.to_string()).await
        }
    };
    if let Err(e) = recorded {
        error!(job_id = %job.id, error = %e, "Failed to record job outcome");
    }
}
