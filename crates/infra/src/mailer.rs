//! Outbound email collaborator.
//!
//! Delivery is best effort from the caller's point of view: a failed send is
//! logged and never fails the request that triggered it.

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use apexhms_core::Email;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundEmail {
    pub to: Email,
    pub subject: String,
    pub body: String,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MailError {
    #[error("delivery failed: {0}")]
    Delivery(String),
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: OutboundEmail) -> Result<(), MailError>;
}

/// Sends and swallows the error after logging it.
pub async fn deliver(mailer: &dyn Mailer, email: OutboundEmail) {
    let subject = email.subject.clone();
    if let Err(e) = mailer.send(email).await {
        tracing::error!(error = %e, %subject, "email delivery failed");
    }
}

pub fn verification_email(to: Email, link: &str) -> OutboundEmail {
    OutboundEmail {
        to,
        subject: "Verify your ApexHMS account".to_string(),
        body: format!(
            "Welcome to ApexHMS!\n\nPlease open the link below to verify your account:\n{link}\n"
        ),
    }
}

pub fn welcome_email(to: Email) -> OutboundEmail {
    OutboundEmail {
        to,
        subject: "Your ApexHMS account is active".to_string(),
        body: "Your email has been verified. You can now sign in.\n".to_string(),
    }
}

pub fn appointment_cancelled_email(to: Email, patient_name: &str, scheduled_at: DateTime<Utc>) -> OutboundEmail {
    OutboundEmail {
        to,
        subject: "Appointment cancelled".to_string(),
        body: format!(
            "Dear {patient_name},\n\nYour appointment scheduled for {} has been CANCELLED.\n",
            scheduled_at.format("%Y-%m-%d %H:%M UTC")
        ),
    }
}

/// Fallback when no SMTP relay is configured: writes the whole message,
/// verification link included, to the log so a developer can follow it.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, email: OutboundEmail) -> Result<(), MailError> {
        tracing::info!(to = %email.to, subject = %email.subject, body = %email.body, "email not delivered, logged only");
        Ok(())
    }
}

/// Keeps every message; used by tests to read back verification links.
#[derive(Debug, Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<OutboundEmail>>,
}

impl RecordingMailer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<OutboundEmail> {
        self.sent.lock().map(|s| s.clone()).unwrap_or_default()
    }

    pub fn sent_to(&self, to: &Email) -> Vec<OutboundEmail> {
        self.sent().into_iter().filter(|m| &m.to == to).collect()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, email: OutboundEmail) -> Result<(), MailError> {
        self.sent
            .lock()
            .map_err(|_| MailError::Delivery("recorder poisoned".to_string()))?
            .push(email);
        Ok(())
    }
}
