//! In-memory store used by tests.

use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use herald_common::error::AppError;
use herald_common::types::{DeliveryStatus, Notification, RelatedEntity};

use crate::record::ResolvedNotification;
use crate::store::NotificationStore;

/// Ordered map of records keyed by id. Ids start at 1.
#[derive(Default)]
pub struct MemoryNotificationStore {
    state: RwLock<MemoryState>,
}

#[derive(Default)]
struct MemoryState {
    last_id: i64,
    records: BTreeMap<i64, Notification>,
}

impl MemoryNotificationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.state.read().await.records.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.state.read().await.records.is_empty()
    }

    async fn filter<F>(&self, predicate: F) -> Vec<Notification>
    where
        F: Fn(&Notification) -> bool,
    {
        self.state
            .read()
            .await
            .records
            .values()
            .filter(|n| predicate(n))
            .cloned()
            .collect()
    }
}

#[async_trait]
impl NotificationStore for MemoryNotificationStore {
    async fn insert(&self, notification: ResolvedNotification) -> Result<Notification, AppError> {
        let mut state = self.state.write().await;
        state.last_id += 1;
        let id = state.last_id;

        let stored = notification.into_notification(id);
        state.records.insert(id, stored.clone());
        Ok(stored)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Notification>, AppError> {
        Ok(self.state.read().await.records.get(&id).cloned())
    }

    async fn find_by_recipient(&self, recipient: &str) -> Result<Vec<Notification>, AppError> {
        Ok(self.filter(|n| n.recipient == recipient).await)
    }

    async fn find_all(&self) -> Result<Vec<Notification>, AppError> {
        Ok(self.filter(|_| true).await)
    }

    async fn find_by_status(&self, status: DeliveryStatus) -> Result<Vec<Notification>, AppError> {
        Ok(self.filter(|n| n.status == status).await)
    }

    async fn find_by_related_entity(
        &self,
        entity: &RelatedEntity,
    ) -> Result<Vec<Notification>, AppError> {
        Ok(self
            .filter(|n| {
                n.related_entity_type.as_deref() == Some(entity.entity_type.as_str())
                    && n.related_entity_id.as_deref() == Some(entity.entity_id.as_str())
            })
            .await)
    }

    async fn ping(&self) -> Result<(), AppError> {
        Ok(())
    }
}
