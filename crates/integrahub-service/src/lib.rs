//! # integrahub-service
//!
//! Business logic service layer for IntegraHub. Each service orchestrates
//! the store traits, the outbound HTTP client, local and cloud storage,
//! and the host-framework collaborators to implement one integration.
//!
//! Services follow constructor injection: all dependencies are provided
//! at construction time via `Arc` references.

pub mod backup;
pub mod context;
pub mod file;
pub mod integration;
pub mod mail;
pub mod payment;
pub mod registry;
pub mod webhook;

pub use backup::{BackupUploader, DropboxBackupService};
pub use context::RequestContext;
pub use file::{FileManager, UploadFile};
pub use integration::IntegrationLog;
pub use mail::LoggingMailer;
pub use payment::{PaymentGatewayRegistry, RazorpayGateway};
pub use registry::InMemoryDocumentRegistry;
pub use webhook::{DeliveryOutcome, WebhookDispatcher};
