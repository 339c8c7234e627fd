//! Single-record settings for each integration.

pub mod dropbox;
pub mod razorpay;

pub use dropbox::{BackupFrequency, DropboxSettings};
pub use razorpay::RazorpaySettings;
