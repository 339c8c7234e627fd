//! Cron scheduler for the periodic backup checks and capture sweep.

use std::sync::Arc;

use serde_json::{Value, json};
use tokio_cron_scheduler::{Job as CronJob, JobScheduler};
use tracing::{debug, error, info};

use integrahub_core::error::AppError;
use integrahub_core::traits::{JobEnqueuer, JobRequest};
use integrahub_entity::job::{BackupCheckPayload, job_types, queues};
use integrahub_entity::settings::BackupFrequency;

/// A periodic enqueue of one job.
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduledTask {
    /// Name used in logs.
    pub name: &'static str,
    /// Six-field cron expression, seconds first.
    pub cron: &'static str,
    /// Job type enqueued on each tick.
    pub job_type: &'static str,
    /// Queue the job lands on.
    pub queue: &'static str,
    /// Job payload.
    pub payload: Value,
}

impl ScheduledTask {
    fn request(&self) -> JobRequest {
        JobRequest::new(self.job_type, self.payload.clone()).on_queue(self.queue)
    }
}

/// The tasks registered by [`CronScheduler::register_default_tasks`].
pub fn default_tasks() -> Vec<ScheduledTask> {
    vec![
        ScheduledTask {
            name: "daily_backup_check",
            cron: "0 0 0 * * *",
            job_type: job_types::BACKUP_CHECK,
            queue: queues::LONG,
            payload: backup_check(BackupFrequency::Daily),
        },
        ScheduledTask {
            name: "weekly_backup_check",
            cron: "0 0 0 * * SUN",
            job_type: job_types::BACKUP_CHECK,
            queue: queues::LONG,
            payload: backup_check(BackupFrequency::Weekly),
        },
        ScheduledTask {
            name: "payment_capture",
            cron: "0 */4 * * * *",
            job_type: job_types::PAYMENT_CAPTURE,
            queue: queues::DEFAULT,
            payload: json!({}),
        },
    ]
}

fn backup_check(frequency: BackupFrequency) -> Value {
    json!(BackupCheckPayload { frequency })
}

/// Cron-based scheduler that enqueues periodic jobs.
pub struct CronScheduler {
    scheduler: JobScheduler,
    enqueuer: Arc<dyn JobEnqueuer>,
}

impl std::fmt::Debug for CronScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CronScheduler").finish()
    }
}

impl CronScheduler {
    /// Create a new cron scheduler.
    pub async fn new(enqueuer: Arc<dyn JobEnqueuer>) -> Result<Self, AppError> {
        let scheduler = JobScheduler::new()
            .await
            .map_err(|e| AppError::internal(format!("Failed to create scheduler: {e}")))?;

        Ok(Self {
            scheduler,
            enqueuer,
        })
    }

    /// Register the backup checks and the capture sweep.
    pub async fn register_default_tasks(&self) -> Result<(), AppError> {
        for task in default_tasks() {
            self.register(task).await?;
        }
        info!("All scheduled tasks registered");
        Ok(())
    }

    /// Register one task.
    pub async fn register(&self, task: ScheduledTask) -> Result<(), AppError> {
        let name = task.name;
        let cron = task.cron;
        let enqueuer = Arc::clone(&self.enqueuer);
        let task = Arc::new(task);

        let job = CronJob::new_async(cron, move |_uuid, _lock| {
            let enqueuer = Arc::clone(&enqueuer);
            let task = Arc::clone(&task);
            Box::pin(async move {
                debug!(task = task.name, "Scheduling job");
                if let Err(e) = enqueuer.enqueue(task.request()).await {
                    error!(task = task.name, error = %e, "Failed to enqueue scheduled job");
                }
            })
        })
        .map_err(|e| AppError::internal(format!("Failed to create {name} schedule: {e}")))?;

        self.scheduler
            .add(job)
            .await
            .map_err(|e| AppError::internal(format!("Failed to add {name} schedule: {e}")))?;

        info!(task = name, cron, "Registered scheduled task");
        Ok(())
    }

    /// Start the scheduler.
    pub async fn start(&self) -> Result<(), AppError> {
        self.scheduler
            .start()
            .await
            .map_err(|e| AppError::internal(format!("Failed to start scheduler: {e}")))?;

        info!("Cron scheduler started");
        Ok(())
    }

    /// Shut the scheduler down.
    pub async fn shutdown(&mut self) -> Result<(), AppError> {
        self.scheduler
            .shutdown()
            .await
            .map_err(|e| AppError::internal(format!("Failed to shutdown scheduler: {e}")))?;

        info!("Cron scheduler shut down");
        Ok(())
    }
}
