//! Payment gateway checkout and callbacks.

pub mod gateway;
pub mod razorpay;

pub use gateway::{PaymentGateway, PaymentGatewayRegistry, PaymentRedirect};
pub use razorpay::{CaptureSummary, RazorpayGateway};
