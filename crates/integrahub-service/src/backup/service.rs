//! Dropbox backup settings, OAuth and the scheduled/manual entry points.

use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use serde_json::json;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use integrahub_core::config::{DropboxConfig, SiteConfig, StorageConfig};
use integrahub_core::error::AppError;
use integrahub_core::result::AppResult;
use integrahub_core::traits::{JobEnqueuer, JobRequest, Mailer};
use integrahub_core::types::JobId;
use integrahub_database::SettingsStore;
use integrahub_entity::backup::{BackupReport, BackupTarget};
use integrahub_entity::job::{job_types, queues};
use integrahub_entity::settings::{BackupFrequency, DropboxSettings};
use integrahub_http::HttpClient;
use integrahub_storage::DatabaseDumper;
use integrahub_storage::cloud::dropbox::{self, DropboxConnector, DropboxCredentials};

use super::notify;
use super::uploader::{BackupUploader, PRIVATE_FILES_FOLDER, PUBLIC_FILES_FOLDER};

/// Service name used in notifications.
pub const SERVICE_NAME: &str = "Dropbox";
/// Timeout of an enqueued backup job.
pub const BACKUP_JOB_TIMEOUT_SECONDS: u64 = 1500;
/// Site path Dropbox redirects back to after authorization.
pub const OAUTH_CALLBACK_PATH: &str = "/api/backups/dropbox/callback";
/// How long a handed-out OAuth `state` stays redeemable.
pub const OAUTH_STATE_TTL: Duration = Duration::from_secs(15 * 60);

/// Backups of the database and file roots to Dropbox.
#[derive(Debug)]
pub struct DropboxBackupService {
    settings: Arc<dyn SettingsStore>,
    dumper: Arc<dyn DatabaseDumper>,
    enqueuer: Arc<dyn JobEnqueuer>,
    mailer: Arc<dyn Mailer>,
    http: HttpClient,
    dropbox: DropboxConfig,
    storage: StorageConfig,
    site: SiteConfig,
    /// OAuth `state` values handed out and not yet redeemed, with their
    /// issue time.
    pending_states: DashMap<String, Instant>,
    state_ttl: Duration,
}

impl DropboxBackupService {
    /// Creates the service.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        settings: Arc<dyn SettingsStore>,
        dumper: Arc<dyn DatabaseDumper>,
        enqueuer: Arc<dyn JobEnqueuer>,
        mailer: Arc<dyn Mailer>,
        http: HttpClient,
        dropbox: DropboxConfig,
        storage: StorageConfig,
        site: SiteConfig,
    ) -> Self {
        Self {
            settings,
            dumper,
            enqueuer,
            mailer,
            http,
            dropbox,
            storage,
            site,
            pending_states: DashMap::new(),
            state_ttl: OAUTH_STATE_TTL,
        }
    }

    /// Overrides how long an OAuth `state` stays redeemable.
    pub fn with_oauth_state_ttl(mut self, ttl: Duration) -> Self {
        self.state_ttl = ttl;
        self
    }

    /// OAuth flows started and neither finished nor expired.
    pub fn pending_oauth_states(&self) -> usize {
        self.pending_states.len()
    }

    fn prune_expired_states(&self) {
        let before = self.pending_states.len();
        self.pending_states
            .retain(|_, issued| issued.elapsed() < self.state_ttl);
        let pruned = before.saturating_sub(self.pending_states.len());
        if pruned > 0 {
            debug!(pruned, "Dropped expired Dropbox OAuth states");
        }
    }

    /// Resolves credentials, settings record first and site config second.
    pub fn credentials(&self, settings: &DropboxSettings) -> AppResult<DropboxCredentials> {
        let app_key = non_empty(settings.app_access_key.as_deref())
            .or_else(|| non_empty(self.dropbox.app_key.as_deref()));
        let app_secret = non_empty(settings.app_secret_key.as_deref())
            .or_else(|| non_empty(self.dropbox.app_secret.as_deref()));
        if app_key.is_none() || app_secret.is_none() {
            return Err(AppError::validation(
                "Please set Dropbox access keys in your site config",
            ));
        }
        let access_token = non_empty(settings.dropbox_access_token.as_deref())
            .or_else(|| non_empty(self.dropbox.access_token.as_deref()))
            .unwrap_or_default();

        Ok(DropboxCredentials {
            app_key,
            app_secret,
            access_token,
            refresh_token: non_empty(settings.dropbox_refresh_token.as_deref()),
        })
    }

    /// Where Dropbox sends the user back to.
    ///
    /// A site that keeps its own app secret uses its own callback; otherwise
    /// the configured redirect URI applies.
    pub fn redirect_uri(&self, settings: &DropboxSettings) -> String {
        match (
            non_empty(settings.app_secret_key.as_deref()),
            non_empty(self.dropbox.redirect_uri.as_deref()),
        ) {
            (None, Some(configured)) => configured,
            _ => self.site.absolute_url(OAUTH_CALLBACK_PATH),
        }
    }

    /// The Dropbox page that asks the user to approve access.
    pub async fn authorize_url(&self) -> AppResult<String> {
        let settings = self.settings.dropbox().await?;
        let credentials = self.credentials(&settings)?;
        let app_key = credentials.app_key.unwrap_or_default();
        let state = Uuid::new_v4().simple().to_string();
        let url = dropbox::authorize_url(
            &self.dropbox,
            &app_key,
            &self.redirect_uri(&settings),
            &state,
        )?;
        self.prune_expired_states();
        self.pending_states.insert(state, Instant::now());
        Ok(url)
    }

    /// Completes the OAuth flow and stores the tokens on the settings record.
    pub async fn finish_auth(&self, code: Option<&str>, state: Option<&str>) -> AppResult<()> {
        let (Some(code), Some(state)) = (non_empty(code), non_empty(state)) else {
            return Err(AppError::authentication(
                "Illegal Access Token. Please try again",
            ));
        };
        let issued = self.pending_states.remove(&state).map(|(_, issued)| issued);
        if !issued.is_some_and(|issued| issued.elapsed() < self.state_ttl) {
            warn!("Dropbox authorization returned an unknown or expired state");
            return Err(AppError::authentication(
                "Illegal Access Token. Please try again",
            ));
        }

        let mut settings = self.settings.dropbox().await?;
        let credentials = self.credentials(&settings)?;
        let grant = dropbox::exchange_code(
            &self.http,
            &self.dropbox,
            credentials.app_key.as_deref().unwrap_or_default(),
            credentials.app_secret.as_deref().unwrap_or_default(),
            &code,
            &self.redirect_uri(&settings),
        )
        .await?;

        settings.dropbox_access_token = Some(grant.access_token);
        if grant.refresh_token.is_some() {
            settings.dropbox_refresh_token = grant.refresh_token;
        }
        self.settings.save_dropbox(&settings).await?;
        info!("Dropbox access approved");
        Ok(())
    }

    /// Enqueues a backup on the long queue.
    pub async fn take_backup(&self) -> AppResult<JobId> {
        let request = JobRequest::new(job_types::DROPBOX_BACKUP, json!({}))
            .on_queue(queues::LONG)
            .with_timeout(BACKUP_JOB_TIMEOUT_SECONDS);
        let job_id = self.enqueuer.enqueue(request).await?;
        info!(job_id = %job_id, "Queued for backup. It may take a few minutes to an hour.");
        Ok(job_id)
    }

    /// Daily scheduler entry point.
    pub async fn take_backups_daily(&self) -> AppResult<Option<BackupReport>> {
        self.take_backups_if(BackupFrequency::Daily).await
    }

    /// Weekly scheduler entry point.
    pub async fn take_backups_weekly(&self) -> AppResult<Option<BackupReport>> {
        self.take_backups_if(BackupFrequency::Weekly).await
    }

    /// Runs a backup when the configured frequency is `frequency`.
    pub async fn take_backups_if(
        &self,
        frequency: BackupFrequency,
    ) -> AppResult<Option<BackupReport>> {
        let configured = self.settings.dropbox().await?.backup_frequency;
        if configured != Some(frequency) {
            debug!(%frequency, ?configured, "Backup frequency does not match");
            return Ok(None);
        }
        self.take_backup_to_dropbox().await
    }

    /// Runs a backup now if Dropbox backups are enabled, then mails the
    /// outcome. Returns `None` when disabled.
    pub async fn take_backup_to_dropbox(&self) -> AppResult<Option<BackupReport>> {
        let settings = self.settings.dropbox().await?;
        if !settings.enabled {
            debug!("Dropbox backups are disabled");
            return Ok(None);
        }

        let report = match self.backup_to_dropbox(&settings).await {
            Ok(report) => report,
            Err(e) => {
                error!(error = %e, "Dropbox backup could not start");
                BackupReport::aborted(e.message)
            }
        };
        if !report.is_success() {
            error!(error = %notify::failure_text(&report), "Dropbox backup failed");
        }
        notify::notify(
            self.mailer.as_ref(),
            settings.send_notifications_to.as_deref(),
            &report,
            SERVICE_NAME,
        )
        .await;
        Ok(Some(report))
    }

    /// Uploads the database dump and both file roots.
    ///
    /// A token refreshed during the run is written back to the settings
    /// record.
    pub async fn backup_to_dropbox(&self, settings: &DropboxSettings) -> AppResult<BackupReport> {
        let credentials = self.credentials(settings)?;
        if credentials.access_token.is_empty() {
            return Err(AppError::validation(
                "Dropbox access token is not set. Please authorize Dropbox first",
            ));
        }
        let original_token = credentials.access_token.clone();
        let connector = Arc::new(DropboxConnector::new(
            self.http.clone(),
            self.dropbox.clone(),
            credentials,
        ));

        let uploader = BackupUploader::new(
            connector.clone(),
            Arc::clone(&self.dumper),
            vec![
                BackupTarget::new(&self.storage.public_files_path, PUBLIC_FILES_FOLDER),
                BackupTarget::new(&self.storage.private_files_path, PRIVATE_FILES_FOLDER),
            ],
            self.dropbox.chunk_size_bytes,
            self.dropbox.max_session_renewals,
        );
        let report = uploader.run().await;

        let token = connector.access_token().await;
        if token != original_token {
            match self.store_access_token(token).await {
                Ok(()) => info!("Stored refreshed Dropbox access token"),
                Err(e) => error!(error = %e, "Failed to store refreshed Dropbox access token"),
            }
        }
        Ok(report)
    }

    async fn store_access_token(&self, token: String) -> AppResult<()> {
        let mut latest = self.settings.dropbox().await?;
        latest.dropbox_access_token = Some(token);
        self.settings.save_dropbox(&latest).await
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
