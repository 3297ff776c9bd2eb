//! Notification record store.
//!
//! Records are written once, after their delivery attempt, and only read
//! afterwards. Every list is ordered by ascending `id`.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;

use herald_common::error::AppError;
use herald_common::types::{DeliveryStatus, Notification, RelatedEntity};

use crate::record::ResolvedNotification;

pub use memory::MemoryNotificationStore;
pub use postgres::PgNotificationStore;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NotificationStore: Send + Sync {
    /// Persist a resolved notification and return it with its assigned id.
    async fn insert(&self, notification: ResolvedNotification) -> Result<Notification, AppError>;

    async fn find_by_id(&self, id: i64) -> Result<Option<Notification>, AppError>;

    async fn find_by_recipient(&self, recipient: &str) -> Result<Vec<Notification>, AppError>;

    async fn find_all(&self) -> Result<Vec<Notification>, AppError>;

    async fn find_by_status(&self, status: DeliveryStatus) -> Result<Vec<Notification>, AppError>;

    async fn find_by_related_entity(
        &self,
        entity: &RelatedEntity,
    ) -> Result<Vec<Notification>, AppError>;

    /// Cheap round trip used by health checks.
    async fn ping(&self) -> Result<(), AppError>;
}
