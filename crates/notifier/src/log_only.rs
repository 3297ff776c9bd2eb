//! Delivery client that only logs.

use async_trait::async_trait;

use crate::{DeliveryClient, DeliveryError};

/// Logs each message instead of sending it. Always succeeds.
#[derive(Debug, Clone, Default)]
pub struct LogDeliveryClient;

#[async_trait]
impl DeliveryClient for LogDeliveryClient {
    async fn deliver(&self, to: &str, subject: &str, body: &str) -> Result<(), DeliveryError> {
        tracing::info!(
            to = %to,
            subject = %subject,
            body_len = body.len(),
            "Delivery skipped, message logged only"
        );
        Ok(())
    }
}
