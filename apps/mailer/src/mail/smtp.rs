use std::path::{Path, PathBuf};

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::{Attachment, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::{debug, info};

use crate::config::SmtpConfig;
use crate::mail::{MailError, MailTransport};

/// An in-memory attachment: file name and bytes.
#[derive(Debug, Clone)]
pub(crate) struct AttachmentFile {
    pub name: String,
    pub content: Vec<u8>,
}

/// SMTP mail transport over a STARTTLS relay.
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn new(config: &SmtpConfig) -> Result<Self, MailError> {
        let from = parse_mailbox(&config.from)?;

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
            .map_err(|e| MailError::Smtp(e.to_string()))?
            .port(config.port)
            .credentials(Credentials::new(
                config.username.clone(),
                config.password.clone(),
            ))
            .build();

        info!(
            "SMTP transport configured for {}:{} as {}",
            config.host, config.port, config.from
        );
        Ok(Self { transport, from })
    }
}

#[async_trait]
impl MailTransport for SmtpMailer {
    async fn send(
        &self,
        recipient: &str,
        subject: &str,
        body: &str,
        attachments: &[PathBuf],
    ) -> Result<(), MailError> {
        let to = parse_mailbox(recipient)?;

        let mut files = Vec::with_capacity(attachments.len());
        for path in attachments {
            files.push(read_attachment(path).await?);
        }

        let message = build_message(self.from.clone(), to, subject, body, &files)?;

        self.transport
            .send(message)
            .await
            .map_err(|e| MailError::Smtp(e.to_string()))?;

        debug!("SMTP accepted message to {}", recipient);
        Ok(())
    }
}

fn parse_mailbox(address: &str) -> Result<Mailbox, MailError> {
    address
        .trim()
        .parse::<Mailbox>()
        .map_err(|e| MailError::InvalidAddress {
            address: address.to_string(),
            reason: e.to_string(),
        })
}

async fn read_attachment(path: &Path) -> Result<AttachmentFile, MailError> {
    let content = tokio::fs::read(path)
        .await
        .map_err(|source| MailError::Attachment {
            path: path.to_path_buf(),
            source,
        })?;

    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "attachment".to_string());

    Ok(AttachmentFile { name, content })
}

/// MIME type by file extension. Only PDFs are expected; everything else is opaque.
fn mime_for(name: &str) -> &'static str {
    let is_pdf = Path::new(name)
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));
    if is_pdf {
        "application/pdf"
    } else {
        "application/octet-stream"
    }
}

fn content_type_for(name: &str) -> ContentType {
    ContentType::parse(mime_for(name)).unwrap_or(ContentType::TEXT_PLAIN)
}

/// Builds a multipart/mixed message: the text body first, then one part per attachment.
pub(crate) fn build_message(
    from: Mailbox,
    to: Mailbox,
    subject: &str,
    body: &str,
    attachments: &[AttachmentFile],
) -> Result<Message, MailError> {
    let mut multipart = MultiPart::mixed().singlepart(SinglePart::plain(body.to_string()));

    for file in attachments {
        let part = Attachment::new(file.name.clone())
            .body(file.content.clone(), content_type_for(&file.name));
        multipart = multipart.singlepart(part);
    }

    Message::builder()
        .from(from)
        .to(to)
        .subject(subject)
        .multipart(multipart)
        .map_err(|e| MailError::Build(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mailbox(s: &str) -> Mailbox {
        s.parse().unwrap()
    }

    #[test]
    fn test_message_carries_subject_body_and_attachments() {
        let files = vec![
            AttachmentFile {
                name: "cv.pdf".to_string(),
                content: b"%PDF-1.4 cv".to_vec(),
            },
            AttachmentFile {
                name: "motivation_letter.pdf".to_string(),
                content: b"%PDF-1.4 letter".to_vec(),
            },
        ];

        let message = build_message(
            mailbox("me@example.com"),
            mailbox("hr@acme.example"),
            "Backend Engineer application",
            "Hello,\nPlease find my CV attached.",
            &files,
        )
        .unwrap();

        let raw = String::from_utf8_lossy(&message.formatted()).into_owned();
        assert!(raw.contains("Subject: Backend Engineer application"));
        assert!(raw.contains("To: hr@acme.example"));
        assert!(raw.contains("multipart/mixed"));
        assert!(raw.contains("cv.pdf"));
        assert!(raw.contains("motivation_letter.pdf"));
        assert_eq!(raw.matches("application/pdf").count(), 2);
    }

    #[test]
    fn test_message_without_attachments_still_builds() {
        let message = build_message(
            mailbox("me@example.com"),
            mailbox("hr@acme.example"),
            "Hi",
            "Body",
            &[],
        );
        assert!(message.is_ok());
    }

    #[test]
    fn test_invalid_recipient_is_rejected() {
        let err = parse_mailbox("not an address").unwrap_err();
        assert!(matches!(err, MailError::InvalidAddress { .. }));
    }

    #[test]
    fn test_mime_by_extension() {
        assert_eq!(mime_for("CV.PDF"), "application/pdf");
        assert_eq!(mime_for("portfolio.zip"), "application/octet-stream");
        assert_eq!(mime_for("README"), "application/octet-stream");
    }

    #[tokio::test]
    async fn test_read_attachment_uses_file_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lettre_motivation.pdf");
        tokio::fs::write(&path, b"%PDF").await.unwrap();

        let file = read_attachment(&path).await.unwrap();
        assert_eq!(file.name, "lettre_motivation.pdf");
        assert_eq!(file.content, b"%PDF");
    }

    #[tokio::test]
    async fn test_missing_attachment_is_error() {
        let err = read_attachment(Path::new("/definitely/missing/cv.pdf"))
            .await
            .unwrap_err();
        assert!(matches!(err, MailError::Attachment { .. }));
    }
}
