//! Notification send and history routes.

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;

use herald_common::error::AppError;
use herald_common::types::{DeliveryStatus, Notification, RelatedEntity};

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/notifications", get(list_notifications))
        .route("/notifications/test", post(send_test_email))
        .route("/notifications/send", post(send_email))
        .route("/notifications/{id}", get(get_notification))
        .route("/notifications/recipient/{email}", get(list_by_recipient))
        .route("/notifications/status/{status}", get(list_by_status))
        .route(
            "/notifications/entity/{entity_type}/{entity_id}",
            get(list_by_related_entity),
        )
}

/// Body of `POST /notifications/test`.
#[derive(Debug, Clone, Deserialize)]
pub struct TestEmailRequest {
    pub recipient: String,
    pub name: String,
}

/// Body of `POST /notifications/send`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendEmailRequest {
    pub recipient: String,
    pub subject: String,
    pub body: String,
    #[serde(default)]
    pub related_entity_type: Option<String>,
    #[serde(default)]
    pub related_entity_id: Option<String>,
}

/// POST /notifications/test — Send the canned test e-mail.
async fn send_test_email(
    State(state): State<AppState>,
    Json(request): Json<TestEmailRequest>,
) -> Result<Json<Notification>, AppError> {
    tracing::info!(recipient = %request.recipient, "Received test email request");

    let notification = state
        .notifications
        .send_test_email(&request.recipient, &request.name)
        .await?;
    Ok(Json(notification))
}

/// POST /notifications/send — Send an e-mail and return the recorded attempt.
///
/// Delivery failures still answer 200; the record carries `status: FAILED`.
async fn send_email(
    State(state): State<AppState>,
    Json(request): Json<SendEmailRequest>,
) -> Result<Json<Notification>, AppError> {
    tracing::info!(recipient = %request.recipient, "Received email request");

    let related = RelatedEntity::from_parts(request.related_entity_type, request.related_entity_id);
    let notification = state
        .notifications
        .dispatch(&request.recipient, &request.subject, &request.body, related)
        .await?;
    Ok(Json(notification))
}

/// GET /notifications/{id}
async fn get_notification(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Notification>, AppError> {
    Ok(Json(state.notifications.get(id).await?))
}

/// GET /notifications/recipient/{email}
async fn list_by_recipient(
    State(state): State<AppState>,
    Path(email): Path<String>,
) -> Result<Json<Vec<Notification>>, AppError> {
    Ok(Json(state.notifications.list_by_recipient(&email).await?))
}

/// GET /notifications
async fn list_notifications(
    State(state): State<AppState>,
) -> Result<Json<Vec<Notification>>, AppError> {
    Ok(Json(state.notifications.list_all().await?))
}

/// GET /notifications/status/{status} — `status` is matched case-insensitively.
async fn list_by_status(
    State(state): State<AppState>,
    Path(status): Path<String>,
) -> Result<Json<Vec<Notification>>, AppError> {
    let status: DeliveryStatus = status.parse().map_err(AppError::Validation)?;
    Ok(Json(state.notifications.list_by_status(status).await?))
}

/// GET /notifications/entity/{entity_type}/{entity_id}
async fn list_by_related_entity(
    State(state): State<AppState>,
    Path((entity_type, entity_id)): Path<(String, String)>,
) -> Result<Json<Vec<Notification>>, AppError> {
    let entity = RelatedEntity::new(entity_type, entity_id);
    Ok(Json(state.notifications.list_by_related_entity(&entity).await?))
}
