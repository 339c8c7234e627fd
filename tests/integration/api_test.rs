//! Integration tests for the HTTP API.

mod helpers;

use std::collections::HashMap;

use axum::http::StatusCode;
use serde_json::json;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, ResponseTemplate};

use integrahub_database::JobStore;
use integrahub_entity::integration::IntegrationStatus;
use integrahub_entity::job::{JobStatus, job_types, queues};

const LIVE_AUTH: &str = "Basic cnpwX3Rlc3Rfa2V5OnMzY3JldA==";

#[tokio::test]
async fn test_health() {
    let app = helpers::TestApp::new().await;

    let response = app.request("GET", "/api/health").await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["status"], "ok");
}

#[tokio::test]
async fn test_checkout_url_for_registered_gateway() {
    let app = helpers::TestApp::new().await;

    let response = app
        .request(
            "GET",
            "/api/payments/checkout-url?payment_gateway=Razorpay&amount=500&currency=INR",
        )
        .await;

    assert_eq!(response.status, StatusCode::OK);
    let url = response.body["data"]["url"].as_str().unwrap();
    assert!(url.starts_with("https://shop.example.com/"));
    assert!(url.contains("amount=500"));
}

#[tokio::test]
async fn test_checkout_url_without_gateway_is_rejected() {
    let app = helpers::TestApp::new().await;

    let response = app
        .request("GET", "/api/payments/checkout-url?amount=500")
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["error"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_checkout_url_rejects_unsupported_currency() {
    let app = helpers::TestApp::new().await;

    let response = app
        .request(
            "GET",
            "/api/payments/checkout-url?payment_gateway=Razorpay&amount=500&currency=USD",
        )
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert!(
        response.body["message"]
            .as_str()
            .unwrap()
            .contains("does not support transactions in currency 'USD'")
    );
}

#[tokio::test]
async fn test_checkout_url_for_unknown_gateway_is_not_found() {
    let app = helpers::TestApp::new().await;

    let response = app
        .request("GET", "/api/payments/checkout-url?payment_gateway=Stripe")
        .await;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.body["message"], "Stripe Settings not found");
}

#[tokio::test]
async fn test_razorpay_callback_redirects_to_success() {
    let app = helpers::TestApp::new().await;
    Mock::given(method("GET"))
        .and(path("/v1/payments/pay_42"))
        .and(header("authorization", LIVE_AUTH))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"id": "pay_42", "status": "authorized"})),
        )
        .expect(1)
        .mount(&app.server)
        .await;

    let response = app
        .request(
            "GET",
            "/api/payments/razorpay/callback?razorpay_payment_id=pay_42&amount=50000&redirect_to=%2Fcart",
        )
        .await;

    assert_eq!(response.status, StatusCode::SEE_OTHER);
    assert_eq!(
        response.location.as_deref(),
        Some("https://shop.example.com/payment-success?redirect_to=%2Fcart")
    );
    let authorized = app
        .services
        .log
        .pending("Razorpay", IntegrationStatus::Authorized)
        .await
        .unwrap();
    assert_eq!(authorized.len(), 1);
}

#[tokio::test]
async fn test_razorpay_callback_redirects_to_failure_when_not_authorized() {
    let app = helpers::TestApp::new().await;
    Mock::given(method("GET"))
        .and(path("/v1/payments/pay_43"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"id": "pay_43", "status": "failed"})),
        )
        .mount(&app.server)
        .await;

    let response = app
        .request(
            "GET",
            "/api/payments/razorpay/callback?razorpay_payment_id=pay_43",
        )
        .await;

    assert_eq!(response.status, StatusCode::SEE_OTHER);
    assert_eq!(
        response.location.as_deref(),
        Some("https://shop.example.com/payment-failed")
    );
}

#[tokio::test]
async fn test_backup_trigger_enqueues_long_job() {
    let app = helpers::TestApp::new().await;

    let response = app.request("POST", "/api/backups/dropbox").await;

    assert_eq!(response.status, StatusCode::OK);
    let job_id = response.body["data"]["job_id"].as_str().unwrap();
    let job = app
        .jobs
        .find(job_id.parse().unwrap())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(job.job_type, job_types::DROPBOX_BACKUP);
    assert_eq!(job.queue, queues::LONG);
    assert_eq!(job.status, JobStatus::Pending);
}

#[tokio::test]
async fn test_dropbox_oauth_round_trip() {
    let app = helpers::TestApp::new().await;
    Mock::given(method("POST"))
        .and(path("/oauth2/token"))
        .and(body_string_contains("code=abc123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "granted",
            "refresh_token": "long-lived"
        })))
        .expect(1)
        .mount(&app.server)
        .await;

    let response = app
        .request("GET", "/api/backups/dropbox/authorize-url")
        .await;
    assert_eq!(response.status, StatusCode::OK);
    let url = url::Url::parse(response.body["data"]["url"].as_str().unwrap()).unwrap();
    let query: HashMap<String, String> = url.query_pairs().into_owned().collect();
    assert_eq!(query["client_id"], "app-key");
    assert_eq!(
        query["redirect_uri"],
        "https://shop.example.com/api/backups/dropbox/callback"
    );

    let callback = format!(
        "/api/backups/dropbox/callback?code=abc123&state={}",
        query["state"]
    );
    let approved = app.request("GET", &callback).await;
    assert_eq!(approved.status, StatusCode::OK);
    assert_eq!(approved.body["data"]["message"], "Dropbox access is approved!");

    let replayed = app.request("GET", &callback).await;
    assert_eq!(replayed.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_dropbox_callback_without_code_is_rejected() {
    let app = helpers::TestApp::new().await;

    let response = app
        .request("GET", "/api/backups/dropbox/callback?state=whatever")
        .await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(
        response.body["message"],
        "Illegal Access Token. Please try again"
    );
}
