//! SMTP delivery via lettre's async transport.

use std::time::Duration;

use async_trait::async_trait;
use lettre::message::Mailbox;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use crate::{DeliveryClient, DeliveryError};

/// Connection settings for [`SmtpDeliveryClient`].
#[derive(Debug, Clone)]
pub struct SmtpSettings {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    /// Upgrade with STARTTLS. When false the connection stays plaintext
    /// (local relays such as Mailpit).
    pub starttls: bool,
    pub timeout: Duration,
    pub from_address: String,
}

/// Sends plain-text e-mail through an SMTP relay.
pub struct SmtpDeliveryClient {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpDeliveryClient {
    /// Build the transport. No connection is opened until the first delivery.
    pub fn new(settings: &SmtpSettings) -> Result<Self, DeliveryError> {
        let from: Mailbox = settings.from_address.parse().map_err(
            |e: lettre::address::AddressError| {
                DeliveryError::InvalidAddress(format!("sender {}: {}", settings.from_address, e))
            },
        )?;

        let mut builder = if settings.starttls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&settings.host)
                .map_err(|e| DeliveryError::Transport(e.to_string()))?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&settings.host)
        };

        builder = builder.port(settings.port).timeout(Some(settings.timeout));

        match (&settings.username, &settings.password) {
            (Some(username), Some(password)) => {
                builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
            }
            (None, None) => {}
            _ => {
                return Err(DeliveryError::Credentials(
                    "SMTP_USERNAME and SMTP_PASSWORD must be set together".to_string(),
                ));
            }
        }

        Ok(Self {
            transport: builder.build(),
            from,
        })
    }

    fn build_message(&self, to: &str, subject: &str, body: &str) -> Result<Message, DeliveryError> {
        let to: Mailbox = to.parse().map_err(|e: lettre::address::AddressError| {
            DeliveryError::InvalidAddress(format!("recipient {}: {}", to, e))
        })?;

        Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())
            .map_err(|e| DeliveryError::Build(e.to_string()))
    }
}

#[async_trait]
impl DeliveryClient for SmtpDeliveryClient {
    async fn deliver(&self, to: &str, subject: &str, body: &str) -> Result<(), DeliveryError> {
        let message = self.build_message(to, subject, body)?;

        self.transport
            .send(message)
            .await
            .map_err(|e| DeliveryError::Transport(e.to_string()))?;

        tracing::debug!(to = %to, "SMTP relay accepted message");
        Ok(())
    }
}
