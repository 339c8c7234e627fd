//! # integrahub-http
//!
//! Outbound HTTP for every integration. One [`HttpClient`] wraps a shared
//! `reqwest::Client` so connections are reused across calls; credentials
//! are injected per request and every failure is logged before it is
//! returned.

pub mod client;
pub mod error;
pub mod request;

pub use client::HttpClient;
pub use error::HttpError;
pub use request::{Auth, HttpResponse, RequestBody, RequestSpec};
pub use reqwest::Method;
