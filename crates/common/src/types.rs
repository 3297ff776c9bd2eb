use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Notification channel type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "UPPERCASE")]
#[sqlx(type_name = "text", rename_all = "UPPERCASE")]
pub enum NotificationType {
    Email,
}

impl std::fmt::Display for NotificationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NotificationType::Email => write!(f, "EMAIL"),
        }
    }
}

/// Notification delivery status.
///
/// `Pending` only exists in memory: a notification is resolved to `Sent` or
/// `Failed` before it is stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "UPPERCASE")]
#[sqlx(type_name = "text", rename_all = "UPPERCASE")]
pub enum DeliveryStatus {
    Pending,
    Sent,
    Failed,
}

impl std::fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeliveryStatus::Pending => write!(f, "PENDING"),
            DeliveryStatus::Sent => write!(f, "SENT"),
            DeliveryStatus::Failed => write!(f, "FAILED"),
        }
    }
}

impl std::str::FromStr for DeliveryStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "PENDING" => Ok(DeliveryStatus::Pending),
            "SENT" => Ok(DeliveryStatus::Sent),
            "FAILED" => Ok(DeliveryStatus::Failed),
            _ => Err(format!(
                "Invalid status '{}'. Valid statuses: PENDING, SENT, FAILED",
                s
            )),
        }
    }
}

/// External domain object a notification is correlated with (e.g. an order).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelatedEntity {
    pub entity_type: String,
    pub entity_id: String,
}

impl RelatedEntity {
    pub fn new(entity_type: impl Into<String>, entity_id: impl Into<String>) -> Self {
        Self {
            entity_type: entity_type.into(),
            entity_id: entity_id.into(),
        }
    }

    /// Pair up the two optional halves carried by requests and events.
    ///
    /// Both halves must be present; a lone type or id is discarded.
    pub fn from_parts(entity_type: Option<String>, entity_id: Option<String>) -> Option<Self> {
        match (entity_type, entity_id) {
            (Some(entity_type), Some(entity_id)) => Some(Self::new(entity_type, entity_id)),
            (None, None) => None,
            (entity_type, entity_id) => {
                tracing::warn!(
                    entity_type = ?entity_type,
                    entity_id = ?entity_id,
                    "Incomplete related entity ignored"
                );
                None
            }
        }
    }
}

/// A persisted notification: one row per delivery attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: i64,
    #[serde(rename = "type")]
    pub notification_type: NotificationType,
    pub recipient: String,
    pub subject: String,
    pub body: String,
    pub status: DeliveryStatus,
    pub related_entity_type: Option<String>,
    pub related_entity_id: Option<String>,
    pub attempts: i32,
    pub sent_at: Option<DateTime<Utc>>,
    pub error_detail: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub fn related_entity(&self) -> Option<RelatedEntity> {
        match (&self.related_entity_type, &self.related_entity_id) {
            (Some(entity_type), Some(entity_id)) => {
                Some(RelatedEntity::new(entity_type.clone(), entity_id.clone()))
            }
            _ => None,
        }
    }
}

/// Event published to the notification queue by other services.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationEvent {
    /// Publisher-defined label, e.g. `ORDER_CREATED`. Only used for logging.
    #[serde(default)]
    pub event_type: Option<String>,
    pub recipient: String,
    pub subject: String,
    pub body: String,
    #[serde(default)]
    pub related_entity_type: Option<String>,
    #[serde(default)]
    pub related_entity_id: Option<String>,
}

impl NotificationEvent {
    pub fn related_entity(&self) -> Option<RelatedEntity> {
        RelatedEntity::from_parts(
            self.related_entity_type.clone(),
            self.related_entity_id.clone(),
        )
    }
}
