//! Application builder: wires stores, services, worker and router.

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::Router;
use tokio::sync::watch;
use tracing::{error, info, warn};
use uuid::Uuid;

use integrahub_core::config::AppConfig;
use integrahub_core::error::AppError;
use integrahub_core::result::AppResult;
use integrahub_core::traits::JobEnqueuer;
use integrahub_database::{DatabasePool, Stores, migration};
use integrahub_http::HttpClient;
use integrahub_service::{
    DropboxBackupService, FileManager, InMemoryDocumentRegistry, IntegrationLog, LoggingMailer,
    PaymentGatewayRegistry, RazorpayGateway, WebhookDispatcher,
};
use integrahub_storage::{DatabaseDumper, LocalContentStore, PgDumpDumper};
use integrahub_worker::jobs::{BackupJobHandler, PaymentCaptureJobHandler, WebhookJobHandler};
use integrahub_worker::{CronScheduler, JobExecutor, JobQueue, WorkerRunner};

use crate::router::build_router;
use crate::state::AppState;

/// The services behind the HTTP surface and the job handlers.
#[derive(Debug, Clone)]
pub struct Services {
    /// Host documents, permissions and hooks.
    pub registry: Arc<InMemoryDocumentRegistry>,
    /// Integration request log.
    pub log: IntegrationLog,
    /// File/folder tree.
    pub files: Arc<FileManager>,
    /// Webhook fan-out and delivery.
    pub webhooks: Arc<WebhookDispatcher>,
    /// Razorpay controller.
    pub razorpay: RazorpayGateway,
    /// Dropbox backups and OAuth.
    pub backups: Arc<DropboxBackupService>,
}

impl Services {
    /// Build every service over `stores`.
    pub fn build(
        config: &AppConfig,
        stores: &Stores,
        enqueuer: Arc<dyn JobEnqueuer>,
        dumper: Arc<dyn DatabaseDumper>,
    ) -> AppResult<Self> {
        let http = HttpClient::new(&config.http)?;
        let registry = Arc::new(InMemoryDocumentRegistry::new());
        let log = IntegrationLog::new(Arc::clone(&stores.integration_requests));

        let files = Arc::new(FileManager::new(
            Arc::clone(&stores.files),
            Arc::new(LocalContentStore::new(&config.storage)),
            registry.clone(),
        ));
        let webhooks = Arc::new(WebhookDispatcher::new(
            Arc::clone(&stores.webhooks),
            registry.clone(),
            Arc::clone(&enqueuer),
            http.clone(),
        ));
        let razorpay = RazorpayGateway::new(
            Arc::clone(&stores.settings),
            registry.clone(),
            log.clone(),
            http.clone(),
            config.razorpay.clone(),
            config.site.clone(),
        );
        let backups = Arc::new(DropboxBackupService::new(
            Arc::clone(&stores.settings),
            dumper,
            enqueuer,
            Arc::new(LoggingMailer::new(&config.mail)),
            http,
            config.dropbox.clone(),
            config.storage.clone(),
            config.site.clone(),
        ));

        Ok(Self {
            registry,
            log,
            files,
            webhooks,
            razorpay,
            backups,
        })
    }

    /// An executor with a handler for every job type.
    pub fn executor(&self) -> JobExecutor {
        let mut executor = JobExecutor::new();
        executor.register(Arc::new(BackupJobHandler::new(Arc::clone(&self.backups))));
        executor.register(Arc::new(WebhookJobHandler::new(Arc::clone(&self.webhooks))));
        executor.register(Arc::new(PaymentCaptureJobHandler::new(
            self.razorpay.clone(),
        )));
        executor
    }

    /// Handler state for the router.
    pub fn state(&self, config: Arc<AppConfig>) -> AppState {
        let payments = PaymentGatewayRegistry::new().register(Arc::new(self.razorpay.clone()));
        AppState {
            config,
            started_at: Instant::now(),
            payments: Arc::new(payments),
            razorpay: self.razorpay.clone(),
            backups: Arc::clone(&self.backups),
        }
    }
}

/// Builds the complete Axum application.
pub fn build_app(state: AppState) -> Router {
    build_router(state)
}

/// Runs the IntegraHub server until a shutdown signal arrives.
pub async fn run_server(config: AppConfig) -> AppResult<()> {
    info!("Starting IntegraHub v{}", env!("CARGO_PKG_VERSION"));

    create_data_directories(&config).await?;

    let (stores, db) = if config.database.in_memory {
        info!("Using in-memory stores");
        (Stores::in_memory(), None)
    } else {
        let db = DatabasePool::connect(&config.database).await?;
        migration::run_migrations(&db).await?;
        (db.stores(), Some(db))
    };

    let worker_id = format!("worker-{}", &Uuid::new_v4().simple().to_string()[..8]);
    let queue = Arc::new(JobQueue::new(Arc::clone(&stores.jobs), worker_id));
    let dumper = Arc::new(PgDumpDumper::new(
        &config.storage,
        config.database.url.clone(),
    ));
    let services = Services::build(&config, &stores, queue.clone(), dumper)?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let (worker_handle, scheduler) = if config.worker.enabled {
        let runner = WorkerRunner::new(
            Arc::clone(&queue),
            Arc::new(services.executor()),
            config.worker.clone(),
        );
        let scheduler = CronScheduler::new(queue.clone()).await?;
        scheduler.register_default_tasks().await?;
        scheduler.start().await?;

        let cancel = shutdown_rx.clone();
        let handle = tokio::spawn(async move {
            runner.run(cancel).await;
        });
        info!("Background worker started");
        (Some(handle), Some(scheduler))
    } else {
        info!("Background worker disabled");
        (None, None)
    };

    let config = Arc::new(config);
    let app = build_app(services.state(Arc::clone(&config)));

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind {addr}: {e}")))?;
    info!(%addr, "IntegraHub server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            info!("Shutdown signal received, starting graceful shutdown");
            if shutdown_tx.send(true).is_err() {
                warn!("Worker already stopped");
            }
        })
        .await
        .map_err(|e| AppError::internal(format!("Server error: {e}")))?;

    if let Some(mut scheduler) = scheduler {
        if let Err(e) = scheduler.shutdown().await {
            error!(error = %e, "Scheduler did not shut down cleanly");
        }
    }
    if let Some(handle) = worker_handle {
        let grace = Duration::from_secs(config.server.shutdown_grace_seconds);
        if tokio::time::timeout(grace, handle).await.is_err() {
            warn!("Worker did not stop within the shutdown grace period");
        }
    }
    if let Some(db) = db {
        db.close().await;
    }

    info!("IntegraHub server shut down gracefully");
    Ok(())
}

/// Create the file roots and the backups directory.
async fn create_data_directories(config: &AppConfig) -> AppResult<()> {
    for dir in [
        &config.storage.public_files_path,
        &config.storage.private_files_path,
        &config.storage.backups_path,
    ] {
        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|e| AppError::storage(format!("Failed to create dir '{dir}': {e}")))?;
    }
    Ok(())
}

/// Wait for Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
