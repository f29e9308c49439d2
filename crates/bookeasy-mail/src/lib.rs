//! Outbound mail.
//!
//! Handlers depend on the [`Mailer`] trait only. The server picks
//! [`SmtpMailer`] when an SMTP relay is configured and [`LogMailer`]
//! otherwise; tests use [`RecordingMailer`].

pub mod compose;
pub mod smtp;

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Result, bail};
use async_trait::async_trait;
use tracing::info;

pub use smtp::{SmtpMailer, SmtpSettings};

#[derive(Debug, Clone)]
pub struct MailAttachment {
    pub filename: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct OutgoingMail {
    pub to: String,
    pub subject: String,
    pub body: String,
    pub attachment: Option<MailAttachment>,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, mail: OutgoingMail) -> Result<()>;
}

/// Writes mail to the log instead of delivering it.
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, mail: OutgoingMail) -> Result<()> {
        info!(
            to = %mail.to,
            subject = %mail.subject,
            attachment = mail.attachment.as_ref().map(|a| a.filename.as_str()),
            "SMTP not configured, mail not delivered:\n{}",
            mail.body
        );
        Ok(())
    }
}

/// Keeps every mail in memory. Can be switched into a failing mode.
#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<OutgoingMail>>,
    failing: AtomicBool,
}

impl RecordingMailer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn sent(&self) -> Vec<OutgoingMail> {
        self.sent.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, mail: OutgoingMail) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            bail!("relay refused mail to {}", mail.to);
        }
        self.sent
            .lock()
            .map_err(|e| anyhow::anyhow!("Mailbox lock poisoned: {}", e))?
            .push(mail);
        Ok(())
    }
}
