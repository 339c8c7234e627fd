//! Razorpay: two-phase authorize then capture.
//!
//! The browser callback authorizes a payment; the scheduled sweep captures
//! every authorized one later.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{error, info, warn};
use url::form_urlencoded;

use integrahub_core::config::{RazorpayConfig, SiteConfig};
use integrahub_core::error::AppError;
use integrahub_core::result::AppResult;
use integrahub_core::traits::DocumentRegistry;
use integrahub_database::SettingsStore;
use integrahub_entity::integration::{IntegrationRequest, IntegrationStatus};
use integrahub_entity::settings::RazorpaySettings;
use integrahub_http::{Auth, HttpClient, RequestBody};

use super::gateway::{PaymentGateway, PaymentRedirect};
use crate::integration::IntegrationLog;

/// Gateway and integration service name.
pub const SERVICE_NAME: &str = "Razorpay";
/// Hook invoked on the originating document once a payment is authorized.
pub const ON_PAYMENT_AUTHORIZED: &str = "on_payment_authorized";

const SUCCESS_PAGE: &str = "payment-success";
const FAILURE_PAGE: &str = "payment-failed";
const SERVER_ERROR_STATUS: u16 = 401;
const SERVER_ERROR_MESSAGE: &str = "Seems issue with server's razorpay config. Don't worry, \
                                    in case of failure amount will get refunded to your account.";

/// Counts from one capture sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureSummary {
    /// Requests moved to `Completed`.
    pub completed: usize,
    /// Requests moved to `Failed`.
    pub failed: usize,
    /// Requests the processor did not capture; left `Authorized`.
    pub unchanged: usize,
}

/// The Razorpay gateway controller.
#[derive(Debug, Clone)]
pub struct RazorpayGateway {
    settings: Arc<dyn SettingsStore>,
    registry: Arc<dyn DocumentRegistry>,
    log: IntegrationLog,
    http: HttpClient,
    config: RazorpayConfig,
    site: SiteConfig,
}

impl RazorpayGateway {
    /// Creates the controller.
    pub fn new(
        settings: Arc<dyn SettingsStore>,
        registry: Arc<dyn DocumentRegistry>,
        log: IntegrationLog,
        http: HttpClient,
        config: RazorpayConfig,
        site: SiteConfig,
    ) -> Self {
        Self {
            settings,
            registry,
            log,
            http,
            config,
            site,
        }
    }

    /// Probes the API with the record's key pair, when both halves are set.
    pub async fn validate_credentials(&self, settings: &RazorpaySettings) -> AppResult<()> {
        if !settings.has_credentials() {
            return Ok(());
        }
        let auth = Auth::basic(
            settings.api_key.clone().unwrap_or_default(),
            settings.api_secret.clone().unwrap_or_default(),
        );
        self.http
            .get_json(&self.api_url("/v1/payments"), auth)
            .await
            .map_err(|e| {
                warn!(error = %e, "Razorpay credential check failed");
                AppError::validation("Seems API Key or API Secret is wrong !!!")
            })?;
        Ok(())
    }

    /// Validates and saves the settings record.
    pub async fn save_settings(&self, settings: &RazorpaySettings) -> AppResult<()> {
        self.validate_credentials(settings).await?;
        self.settings.save_razorpay(settings).await?;
        info!(enabled = settings.enabled, "Razorpay settings saved");
        Ok(())
    }

    /// Turns the gateway on after checking its credentials.
    pub async fn enable(&self) -> AppResult<()> {
        let mut settings = self.settings.razorpay().await?;
        self.validate_credentials(&settings).await?;
        settings.enabled = true;
        self.settings.save_razorpay(&settings).await?;
        info!(gateway = SERVICE_NAME, "Payment gateway enabled");
        Ok(())
    }

    /// Records the callback payload and authorizes the payment.
    ///
    /// Never fails: an internal error becomes a server-error redirect.
    pub async fn create_request(&self, data: Value) -> PaymentRedirect {
        match self.try_create_request(data).await {
            Ok(redirect) => redirect,
            Err(e) => {
                error!(error = %e, "Razorpay payment request failed");
                PaymentRedirect {
                    redirect_to: server_error_redirect(),
                    status: SERVER_ERROR_STATUS,
                }
            }
        }
    }

    async fn try_create_request(&self, data: Value) -> AppResult<PaymentRedirect> {
        let request = self
            .log
            .create_request_log(data, "Host", SERVICE_NAME, None)
            .await?;
        self.authorize_payment(&request).await
    }

    /// Asks Razorpay whether the payment of `request` is authorized.
    ///
    /// A lookup failure or any other status leaves the request as it was.
    pub async fn authorize_payment(
        &self,
        request: &IntegrationRequest,
    ) -> AppResult<PaymentRedirect> {
        let data = request.data_json()?;
        let auth = self.credentials(&data).await?;
        let mut redirect_to = note(&data, "redirect_to");
        let redirect_message = note(&data, "redirect_message");
        let payment_id = string_field(&data, "razorpay_payment_id");

        let url = self.api_url(&format!("/v1/payments/{payment_id}"));
        let (authorized, status) = match self.http.get_json(&url, auth).await {
            Ok(response) if is_status(&response, "authorized") => {
                match self
                    .log
                    .set_status(&request.name, IntegrationStatus::Authorized)
                    .await
                {
                    Ok(_) => (true, 200),
                    Err(e) => {
                        error!(request = %request.name, error = %e, "Failed to record authorization");
                        (false, 200)
                    }
                }
            }
            Ok(response) => {
                warn!(
                    request = %request.name,
                    response = %response,
                    "Razorpay Payment not authorized"
                );
                (false, 200)
            }
            Err(e) => {
                error!(request = %request.name, error = %e, "Razorpay payment lookup failed");
                (false, e.status().unwrap_or(502))
            }
        };

        if authorized {
            if let Some(doc) = request.reference() {
                match self
                    .registry
                    .run_method(&doc, ON_PAYMENT_AUTHORIZED, IntegrationStatus::Authorized.as_str())
                    .await
                {
                    Ok(Some(custom)) if !custom.is_empty() => redirect_to = Some(custom),
                    Ok(_) => {}
                    Err(e) => {
                        error!(document = %doc, error = %e, "on_payment_authorized failed")
                    }
                }
            }
            info!(request = %request.name, "Razorpay payment authorized");
        }

        Ok(PaymentRedirect {
            redirect_to: redirect_url(
                authorized,
                redirect_to.as_deref(),
                redirect_message.as_deref(),
            ),
            status,
        })
    }

    /// Captures every authorized Razorpay payment.
    ///
    /// A payment the processor does not report as captured stays
    /// `Authorized`; one whose capture errors is marked `Failed`.
    pub async fn capture_payments(&self) -> AppResult<CaptureSummary> {
        let mut summary = CaptureSummary::default();
        for request in self
            .log
            .pending(SERVICE_NAME, IntegrationStatus::Authorized)
            .await?
        {
            let outcome = match self.capture(&request).await {
                Ok(true) => self
                    .log
                    .set_status(&request.name, IntegrationStatus::Completed)
                    .await
                    .map(|_| true),
                other => other,
            };
            match outcome {
                Ok(true) => summary.completed += 1,
                Ok(false) => {
                    warn!(request = %request.name, "Razorpay did not capture payment");
                    summary.unchanged += 1;
                }
                Err(e) => {
                    error!(request = %request.name, error = %e, "{} Failed", request.name);
                    if let Err(mark) = self.log.mark_failed(&request.name, &e.to_string()).await {
                        error!(request = %request.name, error = %mark, "Failed to mark request failed");
                    }
                    summary.failed += 1;
                }
            }
        }
        info!(
            completed = summary.completed,
            failed = summary.failed,
            unchanged = summary.unchanged,
            "Razorpay capture sweep finished"
        );
        Ok(summary)
    }

    /// Captures one payment; `true` when Razorpay reports it captured.
    async fn capture(&self, request: &IntegrationRequest) -> AppResult<bool> {
        let data = request.data_json()?;
        let auth = self.credentials(&data).await?;
        let payment_id = string_field(&data, "razorpay_payment_id");
        let amount = string_field(&data, "amount");

        let response = self
            .http
            .post_json(
                &self.api_url(&format!("/v1/payments/{payment_id}/capture")),
                auth,
                RequestBody::Form(vec![("amount".to_string(), amount)]),
            )
            .await?;
        Ok(is_status(&response, "captured"))
    }

    /// Key pair for a request: sandbox when `notes.use_sandbox` is set.
    async fn credentials(&self, data: &Value) -> AppResult<Auth> {
        let sandbox = data
            .get("notes")
            .and_then(|notes| notes.get("use_sandbox"))
            .is_some_and(is_truthy);
        if sandbox {
            return match (
                self.config.sandbox_api_key.as_deref(),
                self.config.sandbox_api_secret.as_deref(),
            ) {
                (Some(key), Some(secret)) => Ok(Auth::basic(key, secret)),
                _ => Err(AppError::configuration(
                    "Razorpay sandbox credentials are not configured",
                )),
            };
        }

        let settings = self.settings.razorpay().await?;
        if !settings.has_credentials() {
            return Err(AppError::configuration(
                "Razorpay API Key and API Secret are not set",
            ));
        }
        Ok(Auth::basic(
            settings.api_key.unwrap_or_default(),
            settings.api_secret.unwrap_or_default(),
        ))
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}{path}", self.config.api_base_url.trim_end_matches('/'))
    }
}

impl PaymentGateway for RazorpayGateway {
    fn service_name(&self) -> &str {
        SERVICE_NAME
    }

    fn validate_transaction_currency(&self, currency: &str) -> AppResult<()> {
        if self
            .config
            .supported_currencies
            .iter()
            .any(|c| c == currency)
        {
            return Ok(());
        }
        Err(AppError::validation(format!(
            "Please select another payment method. {SERVICE_NAME} does not support \
             transactions in currency '{currency}'"
        )))
    }

    fn get_payment_url(&self, params: &[(String, String)]) -> String {
        let query = form_urlencoded::Serializer::new(String::new())
            .extend_pairs(params)
            .finish();
        self.site
            .absolute_url(&format!("./integrations/razorpay_checkout?{query}"))
    }
}

/// `payment-success` or `payment-failed`, plus the forwarded parameters.
pub fn redirect_url(
    authorized: bool,
    redirect_to: Option<&str>,
    redirect_message: Option<&str>,
) -> String {
    let page = if authorized { SUCCESS_PAGE } else { FAILURE_PAGE };
    let mut query = form_urlencoded::Serializer::new(String::new());
    let mut has_query = false;
    for (key, value) in [
        ("redirect_to", redirect_to),
        ("redirect_message", redirect_message),
    ] {
        if let Some(value) = value {
            query.append_pair(key, value);
            has_query = true;
        }
    }
    if has_query {
        format!("{page}?{}", query.finish())
    } else {
        page.to_string()
    }
}

fn server_error_redirect() -> String {
    let query = form_urlencoded::Serializer::new(String::new())
        .append_pair("title", "Server Error")
        .append_pair("message", SERVER_ERROR_MESSAGE)
        .finish();
    format!("message?{query}")
}

fn is_status(response: &Value, status: &str) -> bool {
    response.get("status").and_then(Value::as_str) == Some(status)
}

/// A non-empty string under `notes.<key>`.
fn note(data: &Value, key: &str) -> Option<String> {
    data.get("notes")
        .and_then(|notes| notes.get(key))
        .and_then(Value::as_str)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// A field rendered as text; numbers keep their JSON form.
fn string_field(data: &Value, key: &str) -> String {
    match data.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

/// Integer-like truthiness: `1`, `"1"` and `true` are set.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f as i64 != 0),
        Value::String(s) => s.trim().parse::<f64>().is_ok_and(|f| f as i64 != 0),
        _ => false,
    }
}
