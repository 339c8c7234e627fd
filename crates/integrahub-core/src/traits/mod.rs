//! Collaborator traits through which the host framework is reached.
//!
//! Implementations live outside this crate: the server binary wires real
//! adapters, tests wire in-memory fakes.

pub mod jobs;
pub mod mailer;
pub mod registry;

pub use jobs::{JobEnqueuer, JobRequest};
pub use mailer::{MailMessage, Mailer};
pub use registry::{DocPermission, DocumentRegistry};
