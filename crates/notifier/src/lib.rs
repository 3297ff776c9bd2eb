//! Outbound delivery for notifications.
//!
//! A [`DeliveryClient`] makes exactly one attempt to hand a message to its
//! transport and reports the outcome. It never retries; callers decide what a
//! failure means.
//!
//! Implementations:
//! - [`SmtpDeliveryClient`]: plain-text e-mail over an SMTP relay (lettre)
//! - [`LogDeliveryClient`]: logs the message and reports success

pub mod log_only;
pub mod smtp;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use herald_common::config::AppConfig;
use herald_common::error::AppError;

pub use log_only::LogDeliveryClient;
pub use smtp::{SmtpDeliveryClient, SmtpSettings};

/// Why a delivery attempt failed. The variants only refine log output;
/// callers treat every variant the same way.
#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("failed to build message: {0}")]
    Build(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("invalid credentials: {0}")]
    Credentials(String),
}

/// Outbound channel for a single message.
#[async_trait]
pub trait DeliveryClient: Send + Sync {
    /// Attempt to deliver `body` to `to` once.
    async fn deliver(&self, to: &str, subject: &str, body: &str) -> Result<(), DeliveryError>;
}

/// Build the delivery client described by the configuration.
///
/// Without `SMTP_HOST` the service runs with [`LogDeliveryClient`].
pub fn delivery_client_from_config(config: &AppConfig) -> Result<Arc<dyn DeliveryClient>, AppError> {
    let Some(host) = config.smtp_host.as_deref() else {
        tracing::warn!("SMTP_HOST not set, notifications will be logged instead of sent");
        return Ok(Arc::new(LogDeliveryClient));
    };

    let settings = SmtpSettings {
        host: host.to_string(),
        port: config.smtp_port,
        username: config.smtp_username.clone(),
        password: config.smtp_password.clone(),
        starttls: config.smtp_starttls,
        timeout: Duration::from_secs(config.smtp_timeout_secs),
        from_address: config.email_from.clone(),
    };

    let client = SmtpDeliveryClient::new(&settings)
        .map_err(|e| AppError::Config(format!("SMTP delivery client: {}", e)))?;

    tracing::info!(
        host = %settings.host,
        port = settings.port,
        starttls = settings.starttls,
        "SMTP delivery client configured"
    );

    Ok(Arc::new(client))
}
