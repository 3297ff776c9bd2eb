//! PostgreSQL-backed store over the `notifications` table.

use async_trait::async_trait;
use sqlx::PgPool;

use herald_common::error::AppError;
use herald_common::types::{DeliveryStatus, Notification, RelatedEntity};

use crate::record::ResolvedNotification;
use crate::store::NotificationStore;

#[derive(Clone)]
pub struct PgNotificationStore {
    pool: PgPool,
}

impl PgNotificationStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NotificationStore for PgNotificationStore {
    async fn insert(&self, notification: ResolvedNotification) -> Result<Notification, AppError> {
        let (entity_type, entity_id) = match notification.related_entity() {
            Some(entity) => (Some(entity.entity_type.as_str()), Some(entity.entity_id.as_str())),
            None => (None, None),
        };

        let stored: Notification = sqlx::query_as(
            r#"
            INSERT INTO notifications (
                notification_type, recipient, subject, body, status,
                related_entity_type, related_entity_id, attempts,
                sent_at, error_detail, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING *
            "#,
        )
        .bind(notification.notification_type().to_string())
        .bind(notification.recipient())
        .bind(notification.subject())
        .bind(notification.body())
        .bind(notification.status().to_string())
        .bind(entity_type)
        .bind(entity_id)
        .bind(notification.attempts())
        .bind(notification.sent_at())
        .bind(notification.error_detail())
        .bind(notification.created_at())
        .fetch_one(&self.pool)
        .await?;

        tracing::debug!(
            notification_id = stored.id,
            status = %stored.status,
            "Notification stored"
        );

        Ok(stored)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Notification>, AppError> {
        let notification: Option<Notification> =
            sqlx::query_as("SELECT * FROM notifications WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(notification)
    }

    async fn find_by_recipient(&self, recipient: &str) -> Result<Vec<Notification>, AppError> {
        let notifications: Vec<Notification> =
            sqlx::query_as("SELECT * FROM notifications WHERE recipient = $1 ORDER BY id")
                .bind(recipient)
                .fetch_all(&self.pool)
                .await?;

        Ok(notifications)
    }

    async fn find_all(&self) -> Result<Vec<Notification>, AppError> {
        let notifications: Vec<Notification> =
            sqlx::query_as("SELECT * FROM notifications ORDER BY id")
                .fetch_all(&self.pool)
                .await?;

        Ok(notifications)
    }

    async fn find_by_status(&self, status: DeliveryStatus) -> Result<Vec<Notification>, AppError> {
        let notifications: Vec<Notification> =
            sqlx::query_as("SELECT * FROM notifications WHERE status = $1 ORDER BY id")
                .bind(status.to_string())
                .fetch_all(&self.pool)
                .await?;

        Ok(notifications)
    }

    async fn find_by_related_entity(
        &self,
        entity: &RelatedEntity,
    ) -> Result<Vec<Notification>, AppError> {
        let notifications: Vec<Notification> = sqlx::query_as(
            r#"
            SELECT * FROM notifications
            WHERE related_entity_type = $1
              AND related_entity_id = $2
            ORDER BY id
            "#,
        )
        .bind(&entity.entity_type)
        .bind(&entity.entity_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(notifications)
    }

    async fn ping(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
