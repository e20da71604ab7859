//! Email background job.
//!
//! Outgoing mail goes through the queue as an [`EmailJob`]. Without
//! `SMTP_HOST` the message is written to the log instead of being sent.

use serde::{Deserialize, Serialize};
use std::env;

use crate::errors::AppError;

/// Email job payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmailJob {
    /// Recipient email address
    pub to: String,
    pub subject: String,
    /// Plain text body
    pub body: String,
    /// Optional sender override (defaults to SMTP_FROM)
    #[serde(default)]
    pub from: Option<String>,
}

impl EmailJob {
    pub fn new(to: impl Into<String>, subject: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            to: to.into(),
            subject: subject.into(),
            body: body.into(),
            from: None,
        }
    }

    pub fn with_from(mut self, from: impl Into<String>) -> Self {
        self.from = Some(from.into());
        self
    }
}

/// SMTP settings read at delivery time.
struct SmtpSettings {
    host: Option<String>,
    port: u16,
    from: String,
}

impl SmtpSettings {
    fn from_env() -> Self {
        Self {
            host: env::var("SMTP_HOST").ok().filter(|h| !h.is_empty()),
            port: env::var("SMTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(587),
            from: env::var("SMTP_FROM").unwrap_or_else(|_| "orders@storefront.local".to_string()),
        }
    }
}

/// Deliver one email.
pub async fn email_job_handler(job: EmailJob) -> Result<(), AppError> {
    deliver(&job, &SmtpSettings::from_env()).await
}

async fn deliver(job: &EmailJob, settings: &SmtpSettings) -> Result<(), AppError> {
    let from = job.from.as_deref().unwrap_or(&settings.from);

    tracing::info!(to = %job.to, from = %from, subject = %job.subject, "Processing email job");

    let Some(host) = settings.host.as_deref() else {
        tracing::info!(
            "=== EMAIL (not sent) ===\n\
             From: {}\n\
             To: {}\n\
             Subject: {}\n\
             Body:\n{}\n\
             ========================",
            from,
            job.to,
            job.subject,
            job.body
        );
        return Ok(());
    };

    // TODO: hand the message to an SMTP transport once one is added to the stack
    tracing::warn!(
        host,
        port = settings.port,
        to = %job.to,
        "SMTP host configured but no transport is available; email dropped"
    );
    Ok(())
}
