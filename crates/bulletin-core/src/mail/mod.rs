//! Mail sender trait and SMTP implementation.

use std::time::Duration;

use lettre::message::{Mailbox, MultiPart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use crate::config::SmtpConfig;
use crate::render::HtmlDocument;
use crate::{Error, Result};

/// Delivers one rendered newsletter to one address.
///
/// A single attempt per call; retries are the caller's business.
#[async_trait::async_trait]
pub trait MailSender: Send + Sync {
    async fn send(&self, subject: &str, document: &HtmlDocument, to: &str) -> Result<()>;
}

/// SMTP-based sender using lettre
pub struct SmtpMailSender {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailSender {
    pub fn new(config: &SmtpConfig) -> Result<Self> {
        let sender = config
            .sender()
            .ok_or_else(|| Error::Config("EMAIL_USER (or smtp.from) is not configured".to_string()))?;
        let from: Mailbox = sender
            .parse()
            .map_err(|_| Error::InvalidEmail(sender.to_string()))?;

        let mut builder = match config.tls.as_str() {
            "none" => AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.host),
            "tls" => AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)
                .map_err(|e| Error::Mail(e.to_string()))?,
            _ => AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
                .map_err(|e| Error::Mail(e.to_string()))?,
        };

        builder = builder
            .port(config.port)
            .timeout(Some(Duration::from_secs(config.timeout_secs)));

        match (&config.username, &config.password) {
            (Some(username), Some(password)) => {
                builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
            }
            (Some(_), None) => {
                return Err(Error::Config("EMAIL_PASSWORD is not configured".to_string()));
            }
            _ => {}
        }

        Ok(Self {
            transport: builder.build(),
            from,
        })
    }

    /// Build a multipart/alternative message (plain text + HTML)
    fn build_message(&self, subject: &str, document: &HtmlDocument, to: &str) -> Result<Message> {
        let to: Mailbox = to
            .parse()
            .map_err(|_| Error::InvalidEmail(to.to_string()))?;

        Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(subject)
            .multipart(MultiPart::alternative_plain_html(
                document.to_plain_text(),
                document.as_str().to_string(),
            ))
            .map_err(|e| Error::Mail(e.to_string()))
    }
}

#[async_trait::async_trait]
impl MailSender for SmtpMailSender {
    async fn send(&self, subject: &str, document: &HtmlDocument, to: &str) -> Result<()> {
        let message = self.build_message(subject, document, to)?;

        self.transport
            .send(message)
            .await
            .map_err(|e| Error::Mail(e.to_string()))?;

        tracing::info!("Newsletter sent to {}", to);
        Ok(())
    }
}
