//! Payment capture sweep handler.

use async_trait::async_trait;
use serde_json::{Value, json};
use tracing::info;

use integrahub_entity::job::{Job, job_types};
use integrahub_service::RazorpayGateway;

use super::classify;
use crate::executor::{JobExecutionError, JobHandler};

/// Captures authorized Razorpay payments.
#[derive(Debug)]
pub struct PaymentCaptureJobHandler {
    gateway: RazorpayGateway,
}

impl PaymentCaptureJobHandler {
    /// Create a new capture handler.
    pub fn new(gateway: RazorpayGateway) -> Self {
        Self { gateway }
    }
}

#[async_trait]
impl JobHandler for PaymentCaptureJobHandler {
    fn job_types(&self) -> &[&'static str] {
        &[job_types::PAYMENT_CAPTURE]
    }

    async fn execute(&self, job: &Job) -> Result<Option<Value>, JobExecutionError> {
        let summary = self.gateway.capture_payments().await.map_err(classify)?;
        info!(
            job_id = %job.id,
            completed = summary.completed,
            failed = summary.failed,
            unchanged = summary.unchanged,
            "Capture sweep finished"
        );
        Ok(Some(json!(summary)))
    }
}
