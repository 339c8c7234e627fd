//! Dropbox backup entry points, OAuth and notifications.

mod helpers;

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use helpers::{FixedDumper, ReadOnlySettings, RecordingEnqueuer, RecordingMailer, write_file};
use integrahub_core::config::{DropboxConfig, SiteConfig, StorageConfig};
use integrahub_core::error::ErrorKind;
use integrahub_database::SettingsStore;
use integrahub_database::memory::MemorySettingsStore;
use integrahub_entity::backup::BackupStage;
use integrahub_entity::job::{job_types, queues};
use integrahub_entity::settings::{BackupFrequency, DropboxSettings, RazorpaySettings};
use integrahub_service::DropboxBackupService;
use integrahub_service::backup::notify::{FAILURE_SUBJECT, SUCCESS_SUBJECT};

struct Harness {
    _root: TempDir,
    server: MockServer,
    settings: Arc<MemorySettingsStore>,
    mailer: Arc<RecordingMailer>,
    enqueuer: Arc<RecordingEnqueuer>,
    service: DropboxBackupService,
}

fn enabled_settings() -> DropboxSettings {
    DropboxSettings {
        enabled: true,
        app_access_key: Some("app-key".to_string()),
        app_secret_key: Some("app-secret".to_string()),
        dropbox_access_token: Some("tok".to_string()),
        dropbox_refresh_token: Some("refresh".to_string()),
        backup_frequency: Some(BackupFrequency::Daily),
        send_notifications_to: Some("ops@example.com, cto@example.com".to_string()),
        updated_at: None,
    }
}

impl Harness {
    async fn new(settings: DropboxSettings) -> Self {
        Self::build(settings, false).await
    }

    /// A harness whose settings saves all fail.
    async fn read_only(settings: DropboxSettings) -> Self {
        Self::build(settings, true).await
    }

    async fn build(settings: DropboxSettings, read_only: bool) -> Self {
        let root = TempDir::new().expect("tempdir");
        let storage = StorageConfig {
            public_files_path: root.path().join("public").display().to_string(),
            private_files_path: root.path().join("private").display().to_string(),
            backups_path: root.path().join("backups").display().to_string(),
            ..StorageConfig::default()
        };
        for dir in [
            &storage.public_files_path,
            &storage.private_files_path,
            &storage.backups_path,
        ] {
            std::fs::create_dir_all(dir).expect("mkdir");
        }
        let dump = write_file(
            &root.path().join("backups"),
            "20240101_000000-database.dump",
            3,
        );

        let server = MockServer::start().await;
        let dropbox = DropboxConfig {
            api_base_url: server.uri(),
            content_base_url: server.uri(),
            authorize_url: format!("{}/oauth2/authorize", server.uri()),
            ..DropboxConfig::default()
        };
        let settings = Arc::new(MemorySettingsStore::with(
            settings,
            RazorpaySettings::default(),
        ));
        let store: Arc<dyn SettingsStore> = if read_only {
            Arc::new(ReadOnlySettings(settings.clone()))
        } else {
            settings.clone()
        };
        let mailer = RecordingMailer::new();
        let enqueuer = RecordingEnqueuer::new();
        let service = DropboxBackupService::new(
            store,
            Arc::new(FixedDumper { path: dump }),
            enqueuer.clone(),
            mailer.clone(),
            helpers::http_client(),
            dropbox,
            storage,
            SiteConfig {
                url: "https://erp.example.com".to_string(),
            },
        );
        Self {
            _root: root,
            server,
            settings,
            mailer,
            enqueuer,
            service,
        }
    }

    /// Empty remote: every folder is missing and every write succeeds.
    async fn mount_empty_dropbox(&self) {
        for endpoint in ["/2/files/list_folder", "/2/files/get_metadata"] {
            Mock::given(method("POST"))
                .and(path(endpoint))
                .respond_with(ResponseTemplate::new(409).set_body_json(json!({
                    "error_summary": "path/not_found/.."
                })))
                .mount(&self.server)
                .await;
        }
        Mock::given(method("POST"))
            .and(path("/2/files/create_folder_v2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"metadata": {}})))
            .mount(&self.server)
            .await;
    }
}

#[tokio::test]
async fn test_take_backup_enqueues_long_job() {
    let h = Harness::new(enabled_settings()).await;

    h.service.take_backup().await.unwrap();

    let jobs = h.enqueuer.jobs().await;
    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[0].job_type, job_types::DROPBOX_BACKUP);
    assert_eq!(jobs[0].queue, queues::LONG);
    assert_eq!(jobs[0].timeout_seconds, Some(1500));
}

#[tokio::test]
async fn test_frequency_mismatch_and_disabled_do_nothing() {
    let h = Harness::new(enabled_settings()).await;
    assert!(h.service.take_backups_weekly().await.unwrap().is_none());

    let disabled = Harness::new(DropboxSettings {
        enabled: false,
        ..enabled_settings()
    })
    .await;
    assert!(disabled.service.take_backups_daily().await.unwrap().is_none());
    assert!(disabled.mailer.sent().await.is_empty());
    assert!(h.server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_successful_run_mails_recipients() {
    let h = Harness::new(enabled_settings()).await;
    h.mount_empty_dropbox().await;
    Mock::given(method("POST"))
        .and(path("/2/files/upload"))
        .and(header("authorization", "Bearer tok"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"name": "x"})))
        .expect(1)
        .mount(&h.server)
        .await;

    let report = h.service.take_backups_daily().await.unwrap().unwrap();

    assert_eq!(report.stage, BackupStage::Done);
    assert_eq!(report.uploaded, ["/database/20240101_000000-database.dump"]);
    let sent = h.mailer.sent().await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].subject, SUCCESS_SUBJECT);
    assert_eq!(sent[0].recipients, ["ops@example.com", "cto@example.com"]);
}

#[tokio::test]
async fn test_expired_token_is_refreshed_and_stored() {
    let h = Harness::new(enabled_settings()).await;
    h.mount_empty_dropbox().await;
    Mock::given(method("POST"))
        .and(path("/2/files/upload"))
        .and(header("authorization", "Bearer tok"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error_summary": "expired_access_token/.."
        })))
        .mount(&h.server)
        .await;
    Mock::given(method("POST"))
        .and(path("/oauth2/token"))
        .and(body_string_contains("grant_type=refresh_token"))
        .and(body_string_contains("refresh_token=refresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "fresh",
            "expires_in": 14400
        })))
        .expect(1)
        .mount(&h.server)
        .await;
    Mock::given(method("POST"))
        .and(path("/2/files/upload"))
        .and(header("authorization", "Bearer fresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"name": "x"})))
        .expect(1)
        .mount(&h.server)
        .await;

    let report = h.service.take_backup_to_dropbox().await.unwrap().unwrap();

    assert!(report.is_success());
    let stored = h.settings.dropbox().await.unwrap();
    assert_eq!(stored.dropbox_access_token.as_deref(), Some("fresh"));
    assert_eq!(stored.dropbox_refresh_token.as_deref(), Some("refresh"));
}

#[tokio::test]
async fn test_unsaved_refreshed_token_keeps_the_report() {
    let h = Harness::read_only(enabled_settings()).await;
    h.mount_empty_dropbox().await;
    Mock::given(method("POST"))
        .and(path("/2/files/upload"))
        .and(header("authorization", "Bearer tok"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error_summary": "expired_access_token/.."
        })))
        .mount(&h.server)
        .await;
    Mock::given(method("POST"))
        .and(path("/oauth2/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "fresh",
            "expires_in": 14400
        })))
        .mount(&h.server)
        .await;
    Mock::given(method("POST"))
        .and(path("/2/files/upload"))
        .and(header("authorization", "Bearer fresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"name": "x"})))
        .expect(1)
        .mount(&h.server)
        .await;

    let report = h.service.take_backup_to_dropbox().await.unwrap().unwrap();

    assert!(report.is_success());
    let sent = h.mailer.sent().await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].subject, SUCCESS_SUBJECT);
    let stored = h.settings.dropbox().await.unwrap();
    assert_eq!(stored.dropbox_access_token.as_deref(), Some("tok"));
}

#[tokio::test]
async fn test_missing_keys_abort_with_failure_mail() {
    let h = Harness::new(DropboxSettings {
        app_access_key: None,
        app_secret_key: None,
        ..enabled_settings()
    })
    .await;

    let report = h.service.take_backup_to_dropbox().await.unwrap().unwrap();

    assert_eq!(report.stage, BackupStage::Failed);
    assert_eq!(
        report.error.as_deref(),
        Some("Please set Dropbox access keys in your site config")
    );
    let sent = h.mailer.sent().await;
    assert_eq!(sent[0].subject, FAILURE_SUBJECT);
    assert!(sent[0].body.contains("Please set Dropbox access keys"));
}

#[tokio::test]
async fn test_missing_access_token_aborts() {
    let h = Harness::new(DropboxSettings {
        dropbox_access_token: None,
        ..enabled_settings()
    })
    .await;

    let report = h.service.take_backup_to_dropbox().await.unwrap().unwrap();

    assert!(!report.is_success());
    assert!(report.error.unwrap().contains("Please authorize Dropbox first"));
    assert!(h.server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_oauth_round_trip_stores_tokens() {
    let h = Harness::new(DropboxSettings {
        dropbox_access_token: None,
        dropbox_refresh_token: None,
        ..enabled_settings()
    })
    .await;
    Mock::given(method("POST"))
        .and(path("/oauth2/token"))
        .and(body_string_contains("grant_type=authorization_code"))
        .and(body_string_contains("code=abc123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "granted",
            "refresh_token": "long-lived"
        })))
        .expect(1)
        .mount(&h.server)
        .await;

    let url = url::Url::parse(&h.service.authorize_url().await.unwrap()).unwrap();
    let query: std::collections::HashMap<String, String> =
        url.query_pairs().into_owned().collect();
    assert_eq!(query["client_id"], "app-key");
    assert_eq!(
        query["redirect_uri"],
        "https://erp.example.com/api/backups/dropbox/callback"
    );
    let state = query["state"].clone();

    h.service
        .finish_auth(Some("abc123"), Some(&state))
        .await
        .unwrap();

    let stored = h.settings.dropbox().await.unwrap();
    assert_eq!(stored.dropbox_access_token.as_deref(), Some("granted"));
    assert_eq!(stored.dropbox_refresh_token.as_deref(), Some("long-lived"));

    let replay = h
        .service
        .finish_auth(Some("abc123"), Some(&state))
        .await
        .unwrap_err();
    assert!(replay.is(ErrorKind::Authentication));
}

#[tokio::test]
async fn test_callback_without_code_is_rejected() {
    let h = Harness::new(enabled_settings()).await;

    let err = h.service.finish_auth(None, Some("x")).await.unwrap_err();

    assert!(err.is(ErrorKind::Authentication));
    assert_eq!(err.message, "Illegal Access Token. Please try again");
}

#[tokio::test]
async fn test_expired_oauth_state_is_rejected_and_pruned() {
    let h = Harness::new(enabled_settings()).await;
    let h = Harness {
        service: h.service.with_oauth_state_ttl(Duration::ZERO),
        ..h
    };

    let first = url::Url::parse(&h.service.authorize_url().await.unwrap()).unwrap();
    let state = first
        .query_pairs()
        .find(|(key, _)| key == "state")
        .map(|(_, value)| value.into_owned())
        .unwrap();
    h.service.authorize_url().await.unwrap();
    assert_eq!(h.service.pending_oauth_states(), 1);

    let err = h
        .service
        .finish_auth(Some("abc123"), Some(&state))
        .await
        .unwrap_err();
    assert!(err.is(ErrorKind::Authentication));
    assert!(h.server.received_requests().await.unwrap().is_empty());
}
