//! # integrahub-core
//!
//! Core crate for IntegraHub. Contains configuration schemas, typed
//! identifiers, the tagged document reference, the collaborator traits
//! through which the host framework is reached, the transaction scope
//! used for compensating actions, and the unified error system.
//!
//! This crate has **no** internal dependencies on other IntegraHub crates.

pub mod config;
pub mod error;
pub mod result;
pub mod traits;
pub mod transaction;
pub mod types;

pub use error::AppError;
pub use result::AppResult;
