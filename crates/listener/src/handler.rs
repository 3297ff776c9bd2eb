//! Handling of a single queue event.

use herald_common::types::{DeliveryStatus, Notification, NotificationEvent};
use herald_dispatch::service::DispatchService;

/// What happened to one event. The consumer acknowledges all of them.
#[derive(Debug)]
pub enum EventOutcome {
    /// A notification was recorded (its status may still be `FAILED`).
    Dispatched(Notification),
    /// The payload was not a valid event and was dropped.
    Malformed,
    /// Dispatch returned an error (store unavailable); the event was dropped.
    Failed,
}

/// Decode a raw delivery body and handle it.
pub async fn handle_payload(service: &DispatchService, payload: &[u8]) -> EventOutcome {
    match serde_json::from_slice::<NotificationEvent>(payload) {
        Ok(event) => handle_event(service, &event).await,
        Err(e) => {
            tracing::error!(
                error = %e,
                payload_len = payload.len(),
                "Dropping malformed notification event"
            );
            EventOutcome::Malformed
        }
    }
}

/// Dispatch one event. Never returns an error: failures are logged here.
pub async fn handle_event(service: &DispatchService, event: &NotificationEvent) -> EventOutcome {
    let event_type = event.event_type.as_deref().unwrap_or("UNSPECIFIED");

    tracing::info!(
        event_type = %event_type,
        recipient = %event.recipient,
        "Received notification event"
    );

    match service
        .dispatch(
            &event.recipient,
            &event.subject,
            &event.body,
            event.related_entity(),
        )
        .await
    {
        Ok(notification) => {
            if notification.status == DeliveryStatus::Sent {
                tracing::info!(
                    event_type = %event_type,
                    notification_id = notification.id,
                    "Email sent for event"
                );
            } else {
                tracing::warn!(
                    event_type = %event_type,
                    notification_id = notification.id,
                    error = notification.error_detail.as_deref().unwrap_or_default(),
                    "Email delivery failed for event, dropping"
                );
            }
            EventOutcome::Dispatched(notification)
        }
        Err(e) => {
            tracing::error!(
                event_type = %event_type,
                error = %e,
                "Failed to handle notification event, dropping"
            );
            EventOutcome::Failed
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use herald_common::error::AppError;
    use herald_common::types::RelatedEntity;
    use herald_dispatch::record::ResolvedNotification;
    use herald_dispatch::store::{MemoryNotificationStore, NotificationStore};
    use herald_notifier::{DeliveryClient, DeliveryError, LogDeliveryClient};

    use super::*;

    struct UnreachableRelay;

    #[async_trait]
    impl DeliveryClient for UnreachableRelay {
        async fn deliver(&self, _to: &str, _subject: &str, _body: &str) -> Result<(), DeliveryError> {
            Err(DeliveryError::Transport("connection timed out".to_string()))
        }
    }

    /// Store whose every operation fails, as when the database is down.
    struct BrokenStore;

    #[async_trait]
    impl NotificationStore for BrokenStore {
        async fn insert(&self, _n: ResolvedNotification) -> Result<Notification, AppError> {
            Err(AppError::Internal("database down".to_string()))
        }
        async fn find_by_id(&self, _id: i64) -> Result<Option<Notification>, AppError> {
            Err(AppError::Internal("database down".to_string()))
        }
        async fn find_by_recipient(&self, _r: &str) -> Result<Vec<Notification>, AppError> {
            Err(AppError::Internal("database down".to_string()))
        }
        async fn find_all(&self) -> Result<Vec<Notification>, AppError> {
            Err(AppError::Internal("database down".to_string()))
        }
        async fn find_by_status(&self, _s: DeliveryStatus) -> Result<Vec<Notification>, AppError> {
            Err(AppError::Internal("database down".to_string()))
        }
        async fn find_by_related_entity(
            &self,
            _e: &RelatedEntity,
        ) -> Result<Vec<Notification>, AppError> {
            Err(AppError::Internal("database down".to_string()))
        }
        async fn ping(&self) -> Result<(), AppError> {
            Err(AppError::Internal("database down".to_string()))
        }
    }

    fn event_json(recipient: &str) -> Vec<u8> {
        serde_json::to_vec(&serde_json::json!({
            "eventType": "ORDER_CREATED",
            "recipient": recipient,
            "subject": "Order Created Successfully!",
            "body": "Your order has been created.",
            "relatedEntityType": "ORDER",
            "relatedEntityId": "42"
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn test_event_is_dispatched_and_recorded() {
        let store = Arc::new(MemoryNotificationStore::new());
        let service = DispatchService::new(Arc::new(LogDeliveryClient), store.clone());

        let outcome = handle_payload(&service, &event_json("a@x.com")).await;

        match outcome {
            EventOutcome::Dispatched(n) => {
                assert_eq!(n.status, DeliveryStatus::Sent);
                assert_eq!(n.related_entity(), Some(RelatedEntity::new("ORDER", "42")));
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_delivery_failure_does_not_escape_handler() {
        let store = Arc::new(MemoryNotificationStore::new());
        let service = DispatchService::new(Arc::new(UnreachableRelay), store.clone());

        let outcome = handle_payload(&service, &event_json("a@x.com")).await;

        match outcome {
            EventOutcome::Dispatched(n) => {
                assert_eq!(n.status, DeliveryStatus::Failed);
                assert_eq!(n.attempts, 1);
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
        let failed = store.find_by_status(DeliveryStatus::Failed).await.unwrap();
        assert_eq!(failed.len(), 1);
    }

    #[tokio::test]
    async fn test_malformed_payload_is_dropped() {
        let store = Arc::new(MemoryNotificationStore::new());
        let service = DispatchService::new(Arc::new(LogDeliveryClient), store.clone());

        let outcome = handle_payload(&service, b"{\"recipient\": 42").await;

        assert!(matches!(outcome, EventOutcome::Malformed));
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_store_failure_is_dropped() {
        let service = DispatchService::new(Arc::new(LogDeliveryClient), Arc::new(BrokenStore));

        let outcome = handle_payload(&service, &event_json("a@x.com")).await;

        assert!(matches!(outcome, EventOutcome::Failed));
    }
}
