//! Shared test helpers for integration tests.

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use serde_json::{Value, json};
use tempfile::TempDir;
use tower::ServiceExt;
use wiremock::MockServer;

use integrahub_api::Services;
use integrahub_core::config::AppConfig;
use integrahub_database::Stores;
use integrahub_database::memory::{
    MemoryFileStore, MemoryIntegrationRequestStore, MemoryJobStore, MemorySettingsStore,
    MemoryWebhookStore,
};
use integrahub_entity::settings::{BackupFrequency, DropboxSettings, RazorpaySettings};
use integrahub_storage::PgDumpDumper;
use integrahub_worker::JobQueue;

/// Test application context
pub struct TestApp {
    /// The Axum router for making test requests
    pub router: Router,
    /// Fake Razorpay and Dropbox APIs
    pub server: MockServer,
    /// Jobs enqueued by the handlers
    pub jobs: Arc<MemoryJobStore>,
    /// Wired services
    pub services: Services,
    _root: TempDir,
}

impl TestApp {
    /// Create a new test application
    pub async fn new() -> Self {
        let root = TempDir::new().expect("tempdir");
        let server = MockServer::start().await;
        let dir = |name: &str| root.path().join(name).display().to_string();

        let config: AppConfig = serde_json::from_value(json!({
            "server": {},
            "database": { "url": "postgres://unused/integrahub", "in_memory": true },
            "site": { "url": "https://shop.example.com" },
            "storage": {
                "public_files_path": dir("public"),
                "private_files_path": dir("private"),
                "backups_path": dir("backups"),
                "pg_dump_path": "pg_dump"
            },
            "razorpay": { "api_base_url": server.uri() },
            "dropbox": {
                "api_base_url": server.uri(),
                "content_base_url": server.uri(),
                "authorize_url": format!("{}/oauth2/authorize", server.uri())
            }
        }))
        .expect("test config");

        let jobs = Arc::new(MemoryJobStore::new());
        let stores = Stores {
            files: Arc::new(MemoryFileStore::new()),
            integration_requests: Arc::new(MemoryIntegrationRequestStore::new()),
            webhooks: Arc::new(MemoryWebhookStore::new()),
            settings: Arc::new(MemorySettingsStore::with(
                DropboxSettings {
                    enabled: true,
                    app_access_key: Some("app-key".to_string()),
                    app_secret_key: Some("app-secret".to_string()),
                    backup_frequency: Some(BackupFrequency::Daily),
                    ..DropboxSettings::default()
                },
                RazorpaySettings {
                    enabled: true,
                    api_key: Some("rzp_test_key".to_string()),
                    api_secret: Some("s3cret".to_string()),
                    updated_at: None,
                },
            )),
            jobs: jobs.clone(),
        };
        let queue = Arc::new(JobQueue::new(jobs.clone(), "worker-test"));
        let dumper = Arc::new(PgDumpDumper::new(
            &config.storage,
            config.database.url.clone(),
        ));
        let services =
            Services::build(&config, &stores, queue, dumper).expect("Failed to build services");
        let router = integrahub_api::build_app(services.state(Arc::new(config)));

        Self {
            router,
            server,
            jobs,
            services,
            _root: root,
        }
    }

    /// Send a request through the router
    pub async fn request(&self, method: &str, path: &str) -> TestResponse {
        let req = Request::builder()
            .method(method)
            .uri(path)
            .body(Body::empty())
            .expect("Failed to build request");

        let response = self
            .router
            .clone()
            .oneshot(req)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let location = response
            .headers()
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body_bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
            .await
            .expect("Failed to read body");
        let body: Value = serde_json::from_slice(&body_bytes).unwrap_or(Value::Null);

        TestResponse {
            status,
            location,
            body,
        }
    }
}

/// Parsed test response
#[derive(Debug)]
pub struct TestResponse {
    /// HTTP status code
    pub status: StatusCode,
    /// Redirect target, if any
    pub location: Option<String>,
    /// Parsed JSON body
    pub body: Value,
}
