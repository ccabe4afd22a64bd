//! Plain-text SMTP transport.

use async_trait::async_trait;
use config::EmailConfig;
use errors::TransportError;
use lettre::message::Mailbox;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::time::Duration;
use tracing::info;

use crate::transport::{DispatchOptions, Transport};

const SMTP_TIMEOUT: Duration = Duration::from_secs(10);

pub struct SmtpTransport {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    to: String
}

impl SmtpTransport {
    pub fn from_config(config: &EmailConfig) -> Result<Self, TransportError> {
        let mut builder =
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.smtp_host)
                .port(config.smtp_port)
                .timeout(Some(SMTP_TIMEOUT));

        if let (Some(user), Some(pass)) = (&config.username, &config.password) {
            builder = builder.credentials(Credentials::new(user.clone(), pass.clone()));
        }

        Ok(Self {
            mailer: builder.build(),
            from: parse_mailbox(&config.from_addr)?,
            to: config.to_addr.clone()
        })
    }
}

#[async_trait]
impl Transport for SmtpTransport {
    async fn send(&self, message: &str, options: &DispatchOptions) -> Result<(), TransportError> {
        let to = parse_mailbox(options.email_to.as_deref().unwrap_or(&self.to))?;
        let subject = options.subject();

        let email = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(message.to_string())
            .map_err(|e| TransportError::Email {
                reason: e.to_string()
            })?;

        self.mailer
            .send(email)
            .await
            .map_err(|e| TransportError::Email {
                reason: e.to_string()
            })?;

        info!("Email notification sent: {}", subject);
        Ok(())
    }
}

fn parse_mailbox(addr: &str) -> Result<Mailbox, TransportError> {
    addr.parse().map_err(|e| TransportError::Email {
        reason: format!("Invalid address {addr}: {e}")
    })
}
