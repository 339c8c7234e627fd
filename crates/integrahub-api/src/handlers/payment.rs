//! Payment checkout and processor callback handlers.

use axum::Json;
use axum::extract::{Query, State};
use axum::response::Redirect;
use tracing::info;

use crate::dto::request::payment_callback_payload;
use crate::dto::response::{ApiResponse, UrlResponse};
use crate::error::ApiError;
use crate::state::AppState;

/// GET /api/payments/checkout-url
///
/// Resolves the gateway named by `payment_gateway` and returns its checkout
/// page for the remaining parameters.
pub async fn checkout_url(
    State(state): State<AppState>,
    Query(params): Query<Vec<(String, String)>>,
) -> Result<Json<ApiResponse<UrlResponse>>, ApiError> {
    let url = state.payments.get_checkout_url(&params)?;
    Ok(Json(ApiResponse::ok(UrlResponse { url })))
}

/// GET /api/payments/razorpay/callback
///
/// Logs the payment, asks Razorpay whether it is authorized and sends the
/// browser on to the success or failure page.
pub async fn razorpay_callback(
    State(state): State<AppState>,
    Query(params): Query<Vec<(String, String)>>,
) -> Redirect {
    let redirect = state
        .razorpay
        .create_request(payment_callback_payload(params))
        .await;
    info!(
        redirect_to = %redirect.redirect_to,
        status = redirect.status,
        "Razorpay callback handled"
    );
    Redirect::to(&state.config.site.absolute_url(&redirect.redirect_to))
}
