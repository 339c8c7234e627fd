//! # integrahub-entity
//!
//! Domain entity models for IntegraHub. Every struct in this crate
//! represents a database table row or a domain value object. All entities
//! derive `Debug`, `Clone`, `Serialize`, `Deserialize`, and database
//! entities additionally derive `sqlx::FromRow`.

pub mod backup;
pub mod file;
pub mod integration;
pub mod job;
pub mod settings;
pub mod webhook;
