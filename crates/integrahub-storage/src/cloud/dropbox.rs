//! Dropbox API v2 client.
//!
//! RPC endpoints take a JSON body on `api_base_url`; upload endpoints take
//! raw bytes on `content_base_url` with their arguments JSON-encoded in the
//! `Dropbox-API-Arg` header.

use std::fmt::Write as _;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use integrahub_core::config::DropboxConfig;
use integrahub_core::error::AppError;
use integrahub_core::result::AppResult;
use integrahub_entity::backup::RemoteEntry;
use integrahub_http::{Auth, HttpClient, HttpError, HttpResponse, RequestSpec};

use super::{CloudConnector, CloudStorage, CloudStorageError, RemoteMetadata, UploadCursor};

const API_ARG_HEADER: &str = "Dropbox-API-Arg";
const OCTET_STREAM: &str = "application/octet-stream";

/// Credentials a [`DropboxConnector`] authenticates with.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DropboxCredentials {
    /// App key, needed for token refresh.
    pub app_key: Option<String>,
    /// App secret, needed for token refresh.
    pub app_secret: Option<String>,
    /// Current access token.
    pub access_token: String,
    /// Long-lived refresh token, when the app was granted offline access.
    pub refresh_token: Option<String>,
}

/// Token response of the OAuth endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TokenGrant {
    /// New access token.
    pub access_token: String,
    /// Refresh token, only sent on the initial code exchange.
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Access token lifetime in seconds.
    #[serde(default)]
    pub expires_in: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct ListFolderResult {
    entries: Vec<EntryMetadata>,
    cursor: String,
    has_more: bool,
}

#[derive(Debug, Deserialize)]
struct EntryMetadata {
    #[serde(rename = ".tag")]
    tag: String,
    name: String,
    #[serde(default)]
    path_display: Option<String>,
    #[serde(default)]
    size: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct SessionStartResult {
    session_id: String,
}

/// A Dropbox client bound to one access token.
#[derive(Debug, Clone)]
pub struct DropboxClient {
    http: HttpClient,
    api_base: String,
    content_base: String,
    access_token: String,
}

impl DropboxClient {
    /// Creates a client for `access_token`.
    pub fn new(http: HttpClient, config: &DropboxConfig, access_token: impl Into<String>) -> Self {
        Self {
            http,
            api_base: config.api_base_url.trim_end_matches('/').to_string(),
            content_base: config.content_base_url.trim_end_matches('/').to_string(),
            access_token: access_token.into(),
        }
    }

    async fn rpc(
        &self,
        endpoint: &str,
        context: &str,
        body: Value,
    ) -> Result<Value, CloudStorageError> {
        let url = format!("{}/2/{endpoint}", self.api_base);
        let spec = RequestSpec::post(&url)
            .auth(Auth::Bearer(self.access_token.clone()))
            .json(body);
        let response = self.http.send(spec).await?;
        decode(&url, context, &response)
    }

    async fn content(
        &self,
        endpoint: &str,
        context: &str,
        arg: Value,
        data: Bytes,
    ) -> Result<Value, CloudStorageError> {
        let url = format!("{}/2/{endpoint}", self.content_base);
        let spec = RequestSpec::post(&url)
            .auth(Auth::Bearer(self.access_token.clone()))
            .header(API_ARG_HEADER, api_arg(&arg))
            .bytes(OCTET_STREAM, data);
        let response = self.http.send(spec).await?;
        decode(&url, context, &response)
    }
}

#[async_trait]
impl CloudStorage for DropboxClient {
    async fn list_folder(&self, path: &str) -> Result<Vec<RemoteEntry>, CloudStorageError> {
        let mut page = self
            .rpc("files/list_folder", path, json!({ "path": path }))
            .await?;
        let mut entries = Vec::new();
        loop {
            let listing: ListFolderResult = parse(&self.api_base, page)?;
            entries.extend(
                listing
                    .entries
                    .into_iter()
                    .filter(|entry| entry.tag == "file")
                    .map(|entry| RemoteEntry {
                        name: entry.name,
                        size: entry.size.unwrap_or_default(),
                    }),
            );
            if !listing.has_more {
                break;
            }
            page = self
                .rpc(
                    "files/list_folder/continue",
                    path,
                    json!({ "cursor": listing.cursor }),
                )
                .await?;
        }
        debug!(path, entries = entries.len(), "Listed Dropbox folder");
        Ok(entries)
    }

    async fn get_metadata(&self, path: &str) -> Result<RemoteMetadata, CloudStorageError> {
        let value = self
            .rpc("files/get_metadata", path, json!({ "path": path }))
            .await?;
        let entry: EntryMetadata = parse(&self.api_base, value)?;
        Ok(RemoteMetadata {
            is_folder: entry.tag == "folder",
            path: entry.path_display.unwrap_or_else(|| path.to_string()),
            name: entry.name,
            size: entry.size,
        })
    }

    async fn create_folder(&self, path: &str) -> Result<(), CloudStorageError> {
        self.rpc(
            "files/create_folder_v2",
            path,
            json!({ "path": path, "autorename": false }),
        )
        .await?;
        info!(path, "Created Dropbox folder");
        Ok(())
    }

    async fn upload(&self, path: &str, data: Bytes) -> Result<(), CloudStorageError> {
        let bytes = data.len();
        self.content(
            "files/upload",
            path,
            json!({ "path": path, "mode": "overwrite", "mute": true }),
            data,
        )
        .await?;
        debug!(path, bytes, "Uploaded file to Dropbox");
        Ok(())
    }

    async fn start_session(&self, first_chunk: Bytes) -> Result<String, CloudStorageError> {
        let value = self
            .content(
                "files/upload_session/start",
                "upload session",
                json!({ "close": false }),
                first_chunk,
            )
            .await?;
        let started: SessionStartResult = parse(&self.content_base, value)?;
        Ok(started.session_id)
    }

    async fn append(&self, cursor: &UploadCursor, chunk: Bytes) -> Result<(), CloudStorageError> {
        self.content(
            "files/upload_session/append_v2",
            &cursor.session_id,
            json!({
                "cursor": { "session_id": cursor.session_id, "offset": cursor.offset },
                "close": false
            }),
            chunk,
        )
        .await?;
        Ok(())
    }

    async fn finish(
        &self,
        cursor: &UploadCursor,
        last_chunk: Bytes,
        path: &str,
    ) -> Result<(), CloudStorageError> {
        self.content(
            "files/upload_session/finish",
            path,
            json!({
                "cursor": { "session_id": cursor.session_id, "offset": cursor.offset },
                "commit": { "path": path, "mode": "overwrite", "mute": true }
            }),
            last_chunk,
        )
        .await?;
        debug!(path, session_id = %cursor.session_id, "Committed Dropbox upload session");
        Ok(())
    }
}

/// Hands out [`DropboxClient`]s and refreshes the token on renewal.
#[derive(Debug)]
pub struct DropboxConnector {
    http: HttpClient,
    config: DropboxConfig,
    credentials: RwLock<DropboxCredentials>,
}

impl DropboxConnector {
    /// Creates a connector.
    pub fn new(http: HttpClient, config: DropboxConfig, credentials: DropboxCredentials) -> Self {
        Self {
            http,
            config,
            credentials: RwLock::new(credentials),
        }
    }

    /// The access token currently in use, refreshed or not.
    pub async fn access_token(&self) -> String {
        self.credentials.read().await.access_token.clone()
    }
}

#[async_trait]
impl CloudConnector for DropboxConnector {
    async fn connect(&self) -> Result<Arc<dyn CloudStorage>, CloudStorageError> {
        let token = self.access_token().await;
        Ok(Arc::new(DropboxClient::new(
            self.http.clone(),
            &self.config,
            token,
        )))
    }

    async fn renew(&self) -> Result<Arc<dyn CloudStorage>, CloudStorageError> {
        let credentials = self.credentials.read().await.clone();
        match (
            credentials.refresh_token.as_deref(),
            credentials.app_key.as_deref(),
            credentials.app_secret.as_deref(),
        ) {
            (Some(refresh_token), Some(app_key), Some(app_secret)) => {
                let grant = refresh_access_token(
                    &self.http,
                    &self.config,
                    app_key,
                    app_secret,
                    refresh_token,
                )
                .await?;
                self.credentials.write().await.access_token = grant.access_token;
                info!("Refreshed Dropbox access token");
            }
            _ => warn!("No Dropbox refresh token configured, reconnecting with the stored token"),
        }
        self.connect().await
    }
}

/// The OAuth authorize page URL the user is sent to.
pub fn authorize_url(
    config: &DropboxConfig,
    app_key: &str,
    redirect_uri: &str,
    state: &str,
) -> AppResult<String> {
    let url = url::Url::parse_with_params(
        &config.authorize_url,
        &[
            ("response_type", "code"),
            ("client_id", app_key),
            ("redirect_uri", redirect_uri),
            ("state", state),
            ("token_access_type", "offline"),
        ],
    )
    .map_err(|e| {
        AppError::configuration(format!(
            "Invalid Dropbox authorize URL {}: {e}",
            config.authorize_url
        ))
    })?;
    Ok(url.into())
}

/// Exchanges an authorization code for tokens.
pub async fn exchange_code(
    http: &HttpClient,
    config: &DropboxConfig,
    app_key: &str,
    app_secret: &str,
    code: &str,
    redirect_uri: &str,
) -> Result<TokenGrant, CloudStorageError> {
    token_request(
        http,
        config,
        vec![
            ("grant_type".to_string(), "authorization_code".to_string()),
            ("code".to_string(), code.to_string()),
            ("redirect_uri".to_string(), redirect_uri.to_string()),
            ("client_id".to_string(), app_key.to_string()),
            ("client_secret".to_string(), app_secret.to_string()),
        ],
    )
    .await
}

async fn refresh_access_token(
    http: &HttpClient,
    config: &DropboxConfig,
    app_key: &str,
    app_secret: &str,
    refresh_token: &str,
) -> Result<TokenGrant, CloudStorageError> {
    token_request(
        http,
        config,
        vec![
            ("grant_type".to_string(), "refresh_token".to_string()),
            ("refresh_token".to_string(), refresh_token.to_string()),
            ("client_id".to_string(), app_key.to_string()),
            ("client_secret".to_string(), app_secret.to_string()),
        ],
    )
    .await
}

async fn token_request(
    http: &HttpClient,
    config: &DropboxConfig,
    form: Vec<(String, String)>,
) -> Result<TokenGrant, CloudStorageError> {
    let url = format!("{}/oauth2/token", config.api_base_url.trim_end_matches('/'));
    let response = http.send(RequestSpec::post(&url).form(form)).await?;
    let value = decode(&url, "oauth2/token", &response)?;
    parse(&url, value)
}

fn decode(
    url: &str,
    context: &str,
    response: &HttpResponse,
) -> Result<Value, CloudStorageError> {
    if !response.is_success() {
        let err = classify(context, response);
        warn!(url, status = response.status, error = %err, "Dropbox call failed");
        return Err(err);
    }
    if response.body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Null);
    }
    response.json().map_err(|e| {
        CloudStorageError::Transport(HttpError::Decode {
            url: url.to_string(),
            message: e.to_string(),
        })
    })
}

fn parse<T: DeserializeOwned>(url: &str, value: Value) -> Result<T, CloudStorageError> {
    serde_json::from_value(value).map_err(|e| {
        CloudStorageError::Transport(HttpError::Decode {
            url: url.to_string(),
            message: e.to_string(),
        })
    })
}

/// Maps an error response onto the provider error taxonomy.
fn classify(context: &str, response: &HttpResponse) -> CloudStorageError {
    let summary = error_summary(response);
    match response.status {
        401 if summary.contains("invalid_access_token") => CloudStorageError::InvalidToken(summary),
        401 => CloudStorageError::ExpiredToken(summary),
        409 if summary.contains("not_found") => CloudStorageError::NotFound(context.to_string()),
        status => CloudStorageError::Api { status, summary },
    }
}

fn error_summary(response: &HttpResponse) -> String {
    let Ok(body) = response.json::<Value>() else {
        return response.text();
    };
    ["error_summary", "error_description", "error"]
        .iter()
        .find_map(|key| body.get(*key).and_then(Value::as_str))
        .map(str::to_string)
        .unwrap_or_else(|| body.to_string())
}

/// JSON for the `Dropbox-API-Arg` header, with non-ASCII characters escaped.
fn api_arg(value: &Value) -> String {
    let raw = value.to_string();
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        if c.is_ascii() {
            escaped.push(c);
            continue;
        }
        let mut units = [0u16; 2];
        for unit in c.encode_utf16(&mut units) {
            let _ = write!(escaped, "\\u{unit:04x}");
        }
    }
    escaped
}
