//! # integrahub-api
//!
//! HTTP API layer for IntegraHub built on Axum.
//!
//! Serves the payment checkout lookup and the Razorpay return leg, the
//! manual Dropbox backup trigger and the Dropbox OAuth round trip, and
//! wires stores, services and the background worker into a server.

pub mod app;
pub mod dto;
pub mod error;
pub mod handlers;
pub mod router;
pub mod state;

pub use app::{Services, build_app, run_server};
pub use error::ApiError;
pub use state::AppState;
