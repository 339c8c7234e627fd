//! Background job processing and scheduled tasks for IntegraHub.
//!
//! This crate provides:
//! - A job queue over the durable job store, used as the services' enqueuer
//! - A worker runner that polls the queues and executes jobs
//! - A cron scheduler for the backup checks and the payment capture sweep
//! - Handlers for backups, webhook deliveries and payment captures

pub mod executor;
pub mod jobs;
pub mod queue;
pub mod runner;
pub mod scheduler;

pub use executor::{JobExecutionError, JobExecutor, JobHandler};
pub use queue::JobQueue;
pub use runner::WorkerRunner;
pub use scheduler::CronScheduler;
