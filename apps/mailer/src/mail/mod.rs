//! Outgoing mail.
//!
//! [`MailTransport`] is the seam the dispatch loop talks to; [`SmtpMailer`] is the
//! production implementation over [lettre](https://lettre.rs).

mod smtp;

use std::path::PathBuf;

use async_trait::async_trait;
use thiserror::Error;

pub use smtp::SmtpMailer;

#[derive(Debug, Error)]
pub enum MailError {
    #[error("invalid email address '{address}': {reason}")]
    InvalidAddress { address: String, reason: String },

    #[error("cannot read attachment {}: {source}", path.display())]
    Attachment {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to build message: {0}")]
    Build(String),

    #[error("SMTP error: {0}")]
    Smtp(String),
}

/// Sends one email with a fixed set of attachments.
#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn send(
        &self,
        recipient: &str,
        subject: &str,
        body: &str,
        attachments: &[PathBuf],
    ) -> Result<(), MailError>;
}
