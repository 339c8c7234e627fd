//! HTTP request handlers.

pub mod backup;
pub mod health;
pub mod payment;
