//! Backup result emails.

use tracing::{debug, info, warn};

use integrahub_core::traits::mailer::split_emails;
use integrahub_core::traits::{MailMessage, Mailer};
use integrahub_entity::backup::BackupReport;

/// Subject of the success email.
pub const SUCCESS_SUBJECT: &str = "Backup Upload Successful";
/// Subject of the failure email.
pub const FAILURE_SUBJECT: &str = "[Warning] Backup Upload Failed";

/// Builds the email for a finished run.
pub fn backup_message(
    report: &BackupReport,
    service_name: &str,
    recipients: Vec<String>,
) -> MailMessage {
    if report.is_success() {
        MailMessage {
            recipients,
            subject: SUCCESS_SUBJECT.to_string(),
            body: format!(
                "<h3>Backup Uploaded Successfully</h3><p>Hi there, this is just to inform you \
                 that your backup was successfully uploaded to your {service_name} account. \
                 So relax!</p>"
            ),
        }
    } else {
        MailMessage {
            recipients,
            subject: FAILURE_SUBJECT.to_string(),
            body: format!(
                "<h3>Backup Upload Failed</h3><p>Oops, your automated backup to {service_name} \
                 failed.</p><p>Error message: <br><pre><code>{}</code></pre></p>\
                 <p>Please contact your system manager for more information.</p>",
                failure_text(report)
            ),
        }
    }
}

/// `file - error` lines, followed by the run-level error if the run aborted.
pub fn failure_text(report: &BackupReport) -> String {
    let mut lines = report.failure_lines();
    if let Some(error) = &report.error {
        lines.push(error.clone());
    }
    lines.join("\n")
}

/// Mails the outcome of a run to `send_notifications_to`.
///
/// Best effort: a send failure is logged and never changes the run's outcome.
pub async fn notify(
    mailer: &dyn Mailer,
    send_notifications_to: Option<&str>,
    report: &BackupReport,
    service_name: &str,
) {
    let recipients = split_emails(send_notifications_to.unwrap_or_default());
    if recipients.is_empty() {
        debug!("No backup notification recipients configured");
        return;
    }
    let message = backup_message(report, service_name, recipients);
    let subject = message.subject.clone();
    match mailer.send(message).await {
        Ok(()) => info!(subject = %subject, "Backup notification sent"),
        Err(e) => warn!(subject = %subject, error = %e, "Failed to send backup notification"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use integrahub_entity::backup::{BackupStage, UploadFailure};

    #[test]
    fn test_failure_body_lists_each_file_with_its_error() {
        let report = BackupReport {
            stage: BackupStage::Failed,
            uploaded: vec!["/files/a.png".to_string()],
            failures: vec![
                UploadFailure {
                    file_name: "b.png".to_string(),
                    error: "quota exceeded".to_string(),
                },
                UploadFailure {
                    file_name: "c.pdf".to_string(),
                    error: "timeout".to_string(),
                },
            ],
            error: None,
        };
        let message = backup_message(&report, "Dropbox", vec!["ops@example.com".to_string()]);

        assert_eq!(message.subject, FAILURE_SUBJECT);
        assert!(message.body.contains("b.png - quota exceeded\nc.pdf - timeout"));
        assert!(message.body.contains("automated backup to Dropbox"));
    }

    #[test]
    fn test_success_body_names_the_service() {
        let report = BackupReport {
            stage: BackupStage::Done,
            uploaded: Vec::new(),
            failures: Vec::new(),
            error: None,
        };
        let message = backup_message(&report, "Dropbox", Vec::new());
        assert_eq!(message.subject, SUCCESS_SUBJECT);
        assert!(message.body.contains("uploaded to your Dropbox account"));
    }

    #[test]
    fn test_aborted_run_reports_its_error() {
        let report = BackupReport::aborted("pg_dump exited with status 1");
        assert_eq!(failure_text(&report), "pg_dump exited with status 1");
    }
}
