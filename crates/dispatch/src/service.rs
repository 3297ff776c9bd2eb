//! Dispatch service: attempt a delivery and record its outcome.
//!
//! Each call to [`DispatchService::dispatch`]:
//! 1. Builds a pending notification
//! 2. Makes one delivery attempt through the [`DeliveryClient`]
//! 3. Resolves the notification to `SENT` or `FAILED`
//! 4. Stores it exactly once and returns the stored record
//!
//! Delivery failures become data on the record. The only error `dispatch`
//! returns is a failed store write.

use std::sync::Arc;

use chrono::Utc;

use herald_common::error::AppError;
use herald_common::types::{DeliveryStatus, Notification, RelatedEntity};
use herald_notifier::DeliveryClient;

use crate::record::PendingNotification;
use crate::store::NotificationStore;
use crate::templates;

/// Orchestrates delivery attempts and queries over their history.
#[derive(Clone)]
pub struct DispatchService {
    delivery: Arc<dyn DeliveryClient>,
    store: Arc<dyn NotificationStore>,
}

impl DispatchService {
    pub fn new(delivery: Arc<dyn DeliveryClient>, store: Arc<dyn NotificationStore>) -> Self {
        Self { delivery, store }
    }

    /// Send one e-mail and record the attempt.
    pub async fn dispatch(
        &self,
        recipient: &str,
        subject: &str,
        body: &str,
        related_entity: Option<RelatedEntity>,
    ) -> Result<Notification, AppError> {
        tracing::info!(recipient = %recipient, subject = %subject, "Sending email");

        let pending = PendingNotification::email(recipient, subject, body, related_entity);

        let resolved = match self
            .delivery
            .deliver(pending.recipient(), pending.subject(), pending.body())
            .await
        {
            Ok(()) => {
                tracing::info!(recipient = %recipient, "Email sent");
                pending.mark_sent(Utc::now())
            }
            Err(e) => {
                tracing::error!(recipient = %recipient, error = %e, "Failed to send email");
                pending.mark_failed(e.to_string())
            }
        };

        let stored = self.store.insert(resolved).await?;

        tracing::info!(
            notification_id = stored.id,
            status = %stored.status,
            "Notification recorded"
        );

        Ok(stored)
    }

    /// Send the canned test message to `recipient`, greeting them by `name`.
    pub async fn send_test_email(&self, recipient: &str, name: &str) -> Result<Notification, AppError> {
        let body = templates::test_email_body(name);
        self.dispatch(
            recipient,
            templates::TEST_EMAIL_SUBJECT,
            &body,
            Some(RelatedEntity::new(
                templates::TEST_ENTITY_TYPE,
                templates::TEST_ENTITY_ID,
            )),
        )
        .await
    }

    /// Get a single notification by id.
    pub async fn get(&self, id: i64) -> Result<Notification, AppError> {
        self.store
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Notification not found with id: {}", id)))
    }

    pub async fn list_by_recipient(&self, recipient: &str) -> Result<Vec<Notification>, AppError> {
        self.store.find_by_recipient(recipient).await
    }

    pub async fn list_all(&self) -> Result<Vec<Notification>, AppError> {
        self.store.find_all().await
    }

    pub async fn list_by_status(&self, status: DeliveryStatus) -> Result<Vec<Notification>, AppError> {
        self.store.find_by_status(status).await
    }

    pub async fn list_by_related_entity(
        &self,
        entity: &RelatedEntity,
    ) -> Result<Vec<Notification>, AppError> {
        self.store.find_by_related_entity(entity).await
    }

    /// Verify the store is reachable.
    pub async fn check_store(&self) -> Result<(), AppError> {
        self.store.ping().await
    }
}
