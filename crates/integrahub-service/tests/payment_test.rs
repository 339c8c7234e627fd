//! Razorpay authorize/capture flows against a mocked API.

mod helpers;

use std::sync::Arc;

use serde_json::{Value, json};
use wiremock::matchers::{body_string, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use integrahub_core::config::{RazorpayConfig, SiteConfig};
use integrahub_core::error::ErrorKind;
use integrahub_core::types::{DocRef, Document};
use integrahub_database::SettingsStore;
use integrahub_database::memory::{MemoryIntegrationRequestStore, MemorySettingsStore};
use integrahub_entity::integration::IntegrationStatus;
use integrahub_entity::settings::{DropboxSettings, RazorpaySettings};
use integrahub_service::payment::gateway::PaymentGateway;
use integrahub_service::payment::{PaymentGatewayRegistry, RazorpayGateway};
use integrahub_service::{InMemoryDocumentRegistry, IntegrationLog};

const LIVE_AUTH: &str = "Basic cnpwX3Rlc3Rfa2V5OnMzY3JldA==";
const SANDBOX_AUTH: &str = "Basic cnpwX3NhbmRib3g6c2FuZGJveF9zZWNyZXQ=";

struct Harness {
    server: MockServer,
    gateway: RazorpayGateway,
    log: IntegrationLog,
    registry: Arc<InMemoryDocumentRegistry>,
    settings: Arc<MemorySettingsStore>,
}

impl Harness {
    async fn new() -> Self {
        let server = MockServer::start().await;
        let settings = Arc::new(MemorySettingsStore::with(
            DropboxSettings::default(),
            RazorpaySettings {
                enabled: true,
                api_key: Some("rzp_test_key".to_string()),
                api_secret: Some("s3cret".to_string()),
                updated_at: None,
            },
        ));
        let registry = Arc::new(InMemoryDocumentRegistry::new());
        let log = IntegrationLog::new(Arc::new(MemoryIntegrationRequestStore::new()));
        let config = RazorpayConfig {
            api_base_url: server.uri(),
            sandbox_api_key: Some("rzp_sandbox".to_string()),
            sandbox_api_secret: Some("sandbox_secret".to_string()),
            ..RazorpayConfig::default()
        };
        let gateway = RazorpayGateway::new(
            settings.clone(),
            registry.clone(),
            log.clone(),
            helpers::http_client(),
            config,
            SiteConfig {
                url: "https://shop.example.com".to_string(),
            },
        );
        Self {
            server,
            gateway,
            log,
            registry,
            settings,
        }
    }

    async fn payment_status(&self, payment_id: &str, auth: &str, status: &str) {
        Mock::given(method("GET"))
            .and(path(format!("/v1/payments/{payment_id}")))
            .and(header("authorization", auth))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"id": payment_id, "status": status})),
            )
            .mount(&self.server)
            .await;
    }

    async fn authorized_request(&self, payment_id: &str, amount: u64) -> String {
        let request = self
            .log
            .create_request_log(
                json!({"razorpay_payment_id": payment_id, "amount": amount}),
                "Host",
                "Razorpay",
                None,
            )
            .await
            .expect("create request");
        self.log
            .set_status(&request.name, IntegrationStatus::Authorized)
            .await
            .expect("authorize");
        request.name
    }

    async fn status_of(&self, name: &str) -> IntegrationStatus {
        self.log.get(name).await.expect("request").status
    }
}

fn callback(payment_id: &str, notes: Value) -> Value {
    json!({
        "razorpay_payment_id": payment_id,
        "amount": 50000,
        "currency": "INR",
        "reference_doctype": "Sales Order",
        "reference_docname": "SO-0001",
        "notes": notes
    })
}

#[tokio::test]
async fn test_authorized_payment_redirects_to_success_via_document_hook() {
    let h = Harness::new().await;
    h.payment_status("pay_1", LIVE_AUTH, "authorized").await;
    let order = DocRef::new("Sales Order", "SO-0001");
    h.registry
        .insert_document(Document::new("Sales Order", "SO-0001"));
    h.registry
        .set_method_result(&order, "on_payment_authorized", "/orders/SO-0001/thanks");

    let redirect = h
        .gateway
        .create_request(callback("pay_1", json!({"redirect_to": "/cart"})))
        .await;

    assert_eq!(redirect.status, 200);
    assert_eq!(
        redirect.redirect_to,
        "payment-success?redirect_to=%2Forders%2FSO-0001%2Fthanks"
    );
    let calls = h.registry.method_calls().await;
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].arg, "Authorized");

    let authorized = h
        .log
        .pending("Razorpay", IntegrationStatus::Authorized)
        .await
        .unwrap();
    assert_eq!(authorized.len(), 1);
    assert_eq!(authorized[0].reference(), Some(order));
}

#[tokio::test]
async fn test_unauthorized_payment_stays_queued_and_forwards_params() {
    let h = Harness::new().await;
    h.payment_status("pay_2", LIVE_AUTH, "failed").await;

    let redirect = h
        .gateway
        .create_request(callback(
            "pay_2",
            json!({"redirect_to": "/cart", "redirect_message": "Please retry"}),
        ))
        .await;

    assert_eq!(
        redirect.redirect_to,
        "payment-failed?redirect_to=%2Fcart&redirect_message=Please+retry"
    );
    let queued = h
        .log
        .pending("Razorpay", IntegrationStatus::Queued)
        .await
        .unwrap();
    assert_eq!(queued.len(), 1);
    assert!(h.registry.method_calls().await.is_empty());
}

#[tokio::test]
async fn test_lookup_error_is_logged_not_raised() {
    let h = Harness::new().await;
    Mock::given(method("GET"))
        .and(path("/v1/payments/pay_3"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": {"code": "BAD_REQUEST_ERROR", "description": "The id provided does not exist"}
        })))
        .mount(&h.server)
        .await;

    let redirect = h.gateway.create_request(callback("pay_3", json!({}))).await;

    assert_eq!(redirect.redirect_to, "payment-failed");
    assert_eq!(redirect.status, 400);
}

#[tokio::test]
async fn test_sandbox_flag_switches_credentials() {
    let h = Harness::new().await;
    h.payment_status("pay_4", SANDBOX_AUTH, "authorized").await;

    let redirect = h
        .gateway
        .create_request(callback("pay_4", json!({"use_sandbox": 1})))
        .await;

    assert_eq!(redirect.redirect_to, "payment-success");
}

#[tokio::test]
async fn test_missing_credentials_yield_server_error_redirect() {
    let h = Harness::new().await;
    h.settings
        .save_razorpay(&RazorpaySettings::default())
        .await
        .unwrap();

    let redirect = h.gateway.create_request(callback("pay_5", json!({}))).await;

    assert_eq!(redirect.status, 401);
    assert!(redirect.redirect_to.starts_with("message?title=Server+Error"));
}

#[tokio::test]
async fn test_capture_sweep_completes_captured_and_leaves_rejected() {
    let h = Harness::new().await;
    let a = h.authorized_request("pay_a", 100).await;
    let b = h.authorized_request("pay_b", 200).await;
    let c = h.authorized_request("pay_c", 300).await;
    for (id, amount, status) in [
        ("pay_a", "100", "captured"),
        ("pay_b", "200", "captured"),
        ("pay_c", "300", "authorized"),
    ] {
        Mock::given(method("POST"))
            .and(path(format!("/v1/payments/{id}/capture")))
            .and(body_string(format!("amount={amount}")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": status})))
            .expect(1)
            .mount(&h.server)
            .await;
    }

    let summary = h.gateway.capture_payments().await.unwrap();

    assert_eq!(summary.completed, 2);
    assert_eq!(summary.unchanged, 1);
    assert_eq!(summary.failed, 0);
    assert_eq!(h.status_of(&a).await, IntegrationStatus::Completed);
    assert_eq!(h.status_of(&b).await, IntegrationStatus::Completed);
    assert_eq!(h.status_of(&c).await, IntegrationStatus::Authorized);
}

#[tokio::test]
async fn test_capture_error_marks_request_failed() {
    let h = Harness::new().await;
    let name = h.authorized_request("pay_x", 100).await;
    Mock::given(method("POST"))
        .and(path("/v1/payments/pay_x/capture"))
        .respond_with(ResponseTemplate::new(400).set_body_string("already captured"))
        .mount(&h.server)
        .await;

    let summary = h.gateway.capture_payments().await.unwrap();

    assert_eq!(summary.failed, 1);
    let request = h.log.get(&name).await.unwrap();
    assert_eq!(request.status, IntegrationStatus::Failed);
    assert!(request.error.unwrap().contains("already captured"));
}

#[tokio::test]
async fn test_wrong_credentials_fail_validation() {
    let h = Harness::new().await;
    Mock::given(method("GET"))
        .and(path("/v1/payments"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&h.server)
        .await;

    let err = h.gateway.enable().await.unwrap_err();

    assert!(err.is(ErrorKind::Validation));
    assert_eq!(err.message, "Seems API Key or API Secret is wrong !!!");
}

#[tokio::test]
async fn test_enable_after_successful_probe() {
    let h = Harness::new().await;
    h.settings
        .save_razorpay(&RazorpaySettings {
            enabled: false,
            api_key: Some("rzp_test_key".to_string()),
            api_secret: Some("s3cret".to_string()),
            updated_at: None,
        })
        .await
        .unwrap();
    Mock::given(method("GET"))
        .and(path("/v1/payments"))
        .and(header("authorization", LIVE_AUTH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"items": []})))
        .expect(1)
        .mount(&h.server)
        .await;

    h.gateway.enable().await.unwrap();

    assert!(h.settings.razorpay().await.unwrap().enabled);
}

#[tokio::test]
async fn test_currency_and_checkout_url() {
    let h = Harness::new().await;
    h.gateway.validate_transaction_currency("INR").unwrap();
    let err = h.gateway.validate_transaction_currency("USD").unwrap_err();
    assert_eq!(
        err.message,
        "Please select another payment method. Razorpay does not support transactions in \
         currency 'USD'"
    );

    let registry = PaymentGatewayRegistry::new().register(Arc::new(h.gateway.clone()));
    let url = registry
        .get_checkout_url(&[
            ("payment_gateway".to_string(), "Razorpay".to_string()),
            ("amount".to_string(), "500".to_string()),
            ("title".to_string(), "Order SO-0001".to_string()),
        ])
        .unwrap();
    assert_eq!(
        url,
        "https://shop.example.com/integrations/razorpay_checkout?\
         payment_gateway=Razorpay&amount=500&title=Order+SO-0001"
    );
}
