//! Payment gateway controllers and lookup by gateway name.

use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::warn;

use integrahub_core::error::AppError;
use integrahub_core::result::AppResult;

/// Query parameter naming the gateway in a checkout request.
pub const PAYMENT_GATEWAY_PARAM: &str = "payment_gateway";
/// Query parameter carrying the transaction currency.
pub const CURRENCY_PARAM: &str = "currency";

/// Where the browser goes after a payment callback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentRedirect {
    /// Site-relative redirect target.
    pub redirect_to: String,
    /// HTTP status reported with the redirect.
    pub status: u16,
}

/// A payment processor as seen by the checkout flow.
pub trait PaymentGateway: Send + Sync + Debug + 'static {
    /// Name the gateway is registered under, e.g. `"Razorpay"`.
    fn service_name(&self) -> &str;

    /// Rejects currencies the processor does not handle.
    fn validate_transaction_currency(&self, currency: &str) -> AppResult<()>;

    /// Absolute URL of the checkout page for these parameters.
    fn get_payment_url(&self, params: &[(String, String)]) -> String;
}

/// Gateways available on this site.
#[derive(Debug, Default, Clone)]
pub struct PaymentGatewayRegistry {
    gateways: HashMap<String, Arc<dyn PaymentGateway>>,
}

impl PaymentGatewayRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a gateway under its service name.
    pub fn register(mut self, gateway: Arc<dyn PaymentGateway>) -> Self {
        self.gateways
            .insert(gateway.service_name().to_string(), gateway);
        self
    }

    /// The controller of `payment_gateway`.
    pub fn get_payment_gateway_controller(
        &self,
        payment_gateway: &str,
    ) -> AppResult<Arc<dyn PaymentGateway>> {
        self.gateways
            .get(payment_gateway)
            .cloned()
            .ok_or_else(|| AppError::not_found(format!("{payment_gateway} Settings not found")))
    }

    /// Checkout URL for a request naming its gateway in `payment_gateway`.
    ///
    /// A `currency` the gateway does not support is rejected.
    pub fn get_checkout_url(&self, params: &[(String, String)]) -> AppResult<String> {
        let gateway = params
            .iter()
            .find(|(key, value)| key == PAYMENT_GATEWAY_PARAM && !value.is_empty())
            .map(|(_, value)| value.as_str());
        let Some(gateway) = gateway else {
            warn!("Checkout requested without a payment gateway");
            return Err(AppError::validation(
                "Looks like something is wrong with this site's payment gateway configuration. \
                 No payment has been made.",
            ));
        };
        let controller = self.get_payment_gateway_controller(gateway)?;
        if let Some((_, currency)) = params
            .iter()
            .find(|(key, value)| key == CURRENCY_PARAM && !value.is_empty())
        {
            controller.validate_transaction_currency(currency)?;
        }
        Ok(controller.get_payment_url(params))
    }
}
