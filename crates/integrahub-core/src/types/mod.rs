//! Core type definitions used across the IntegraHub workspace.

pub mod document;
pub mod id;

pub use document::{DocRef, Document};
pub use id::*;
