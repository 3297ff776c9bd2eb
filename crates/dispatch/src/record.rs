//! Lifecycle of a notification before it is stored.
//!
//! A [`PendingNotification`] is built in memory and consumed by exactly one
//! transition, `mark_sent` or `mark_failed`. Stores only accept the resulting
//! [`ResolvedNotification`], so a `PENDING` record can never be persisted.

use chrono::{DateTime, Utc};

use herald_common::types::{DeliveryStatus, Notification, NotificationType, RelatedEntity};

/// A notification that has not been attempted yet.
#[derive(Debug, Clone)]
pub struct PendingNotification {
    notification_type: NotificationType,
    recipient: String,
    subject: String,
    body: String,
    related_entity: Option<RelatedEntity>,
    created_at: DateTime<Utc>,
}

impl PendingNotification {
    pub fn email(
        recipient: impl Into<String>,
        subject: impl Into<String>,
        body: impl Into<String>,
        related_entity: Option<RelatedEntity>,
    ) -> Self {
        Self {
            notification_type: NotificationType::Email,
            recipient: recipient.into(),
            subject: subject.into(),
            body: body.into(),
            related_entity,
            created_at: Utc::now(),
        }
    }

    pub fn recipient(&self) -> &str {
        &self.recipient
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    /// The single delivery attempt succeeded.
    pub fn mark_sent(self, sent_at: DateTime<Utc>) -> ResolvedNotification {
        ResolvedNotification {
            pending: self,
            status: DeliveryStatus::Sent,
            sent_at: Some(sent_at),
            error_detail: None,
        }
    }

    /// The single delivery attempt failed.
    pub fn mark_failed(self, error_detail: impl Into<String>) -> ResolvedNotification {
        ResolvedNotification {
            pending: self,
            status: DeliveryStatus::Failed,
            sent_at: None,
            error_detail: Some(error_detail.into()),
        }
    }
}

/// A notification whose delivery attempt has finished, ready to be stored.
#[derive(Debug, Clone)]
pub struct ResolvedNotification {
    pending: PendingNotification,
    status: DeliveryStatus,
    sent_at: Option<DateTime<Utc>>,
    error_detail: Option<String>,
}

impl ResolvedNotification {
    pub fn notification_type(&self) -> NotificationType {
        self.pending.notification_type
    }

    pub fn recipient(&self) -> &str {
        &self.pending.recipient
    }

    pub fn subject(&self) -> &str {
        &self.pending.subject
    }

    pub fn body(&self) -> &str {
        &self.pending.body
    }

    pub fn related_entity(&self) -> Option<&RelatedEntity> {
        self.pending.related_entity.as_ref()
    }

    /// Always `Sent` or `Failed`.
    pub fn status(&self) -> DeliveryStatus {
        self.status
    }

    /// One attempt, whatever its outcome.
    pub fn attempts(&self) -> i32 {
        1
    }

    pub fn sent_at(&self) -> Option<DateTime<Utc>> {
        self.sent_at
    }

    pub fn error_detail(&self) -> Option<&str> {
        self.error_detail.as_deref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.pending.created_at
    }

    /// Attach the identifier assigned by a store.
    pub fn into_notification(self, id: i64) -> Notification {
        let attempts = self.attempts();
        let (related_entity_type, related_entity_id) = match self.pending.related_entity {
            Some(entity) => (Some(entity.entity_type), Some(entity.entity_id)),
            None => (None, None),
        };

        Notification {
            id,
            notification_type: self.pending.notification_type,
            recipient: self.pending.recipient,
            subject: self.pending.subject,
            body: self.pending.body,
            status: self.status,
            related_entity_type,
            related_entity_id,
            attempts,
            sent_at: self.sent_at,
            error_detail: self.error_detail,
            created_at: self.pending.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolution_keeps_message_fields() {
        let pending = PendingNotification::email(
            "a@x.com",
            "Hi",
            "B",
            Some(RelatedEntity::new("ORDER", "42")),
        );
        let created_at = pending.created_at;

        let resolved = pending.mark_sent(Utc::now());
        assert_eq!(resolved.recipient(), "a@x.com");
        assert_eq!(resolved.subject(), "Hi");
        assert_eq!(resolved.body(), "B");
        assert_eq!(resolved.related_entity(), Some(&RelatedEntity::new("ORDER", "42")));
        assert_eq!(resolved.created_at(), created_at);
        assert_ne!(resolved.status(), DeliveryStatus::Pending);
    }

    #[test]
    fn test_mark_sent() {
        let now = Utc::now();
        let resolved = PendingNotification::email("a@x.com", "Hi", "B", None).mark_sent(now);
        assert_eq!(resolved.status(), DeliveryStatus::Sent);
        assert_eq!(resolved.attempts(), 1);
        assert_eq!(resolved.sent_at(), Some(now));
        assert_eq!(resolved.error_detail(), None);
    }

    #[test]
    fn test_mark_failed() {
        let resolved = PendingNotification::email("a@x.com", "Hi", "B", None)
            .mark_failed("connection refused");
        assert_eq!(resolved.status(), DeliveryStatus::Failed);
        assert_eq!(resolved.attempts(), 1);
        assert_eq!(resolved.sent_at(), None);
        assert_eq!(resolved.error_detail(), Some("connection refused"));
    }

    #[test]
    fn test_into_notification_splits_related_entity() {
        let notification = PendingNotification::email(
            "a@x.com",
            "Order Created",
            "B",
            Some(RelatedEntity::new("ORDER", "42")),
        )
        .mark_failed("timeout")
        .into_notification(9);

        assert_eq!(notification.id, 9);
        assert_eq!(notification.notification_type, NotificationType::Email);
        assert_eq!(notification.related_entity_type.as_deref(), Some("ORDER"));
        assert_eq!(notification.related_entity_id.as_deref(), Some("42"));
        assert_eq!(notification.attempts, 1);
        assert_eq!(notification.status, DeliveryStatus::Failed);
    }
}
