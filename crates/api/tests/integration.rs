//! Integration tests for API routes.
//!
//! Uses `tower::ServiceExt` to drive the Axum router without a real HTTP
//! server, over the in-memory notification store.

use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::{Value, json};
use tower::ServiceExt;

use herald_api::routes::create_router;
use herald_api::state::AppState;
use herald_dispatch::service::DispatchService;
use herald_dispatch::store::MemoryNotificationStore;
use herald_notifier::{DeliveryClient, DeliveryError};

// ============================================================
// Helpers
// ============================================================

/// Rejects every recipient on the `invalid.test` domain, accepts the rest.
struct DomainRejectingClient;

#[async_trait]
impl DeliveryClient for DomainRejectingClient {
    async fn deliver(&self, to: &str, _subject: &str, _body: &str) -> Result<(), DeliveryError> {
        if to.ends_with("@invalid.test") {
            Err(DeliveryError::Transport("550 mailbox unavailable".to_string()))
        } else {
            Ok(())
        }
    }
}

fn build_test_app() -> Router {
    let service = DispatchService::new(
        Arc::new(DomainRejectingClient),
        Arc::new(MemoryNotificationStore::new()),
    );
    create_router(AppState::new(service))
}

async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    call(app, request).await
}

async fn post_json(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap();
    call(app, request).await
}

async fn call(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).unwrap_or(Value::Null)
    };
    (status, json)
}

// ============================================================
// Routes
// ============================================================

#[tokio::test]
async fn test_health_endpoint() {
    let app = build_test_app();

    let (status, json) = get(&app, "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
    assert_eq!(json["service"], "herald-api");
    assert_eq!(json["store"], "up");
}

#[tokio::test]
async fn test_send_returns_sent_record() {
    let app = build_test_app();

    let (status, json) = post_json(
        &app,
        "/notifications/send",
        json!({
            "recipient": "a@x.com",
            "subject": "Order Created",
            "body": "Your order is in",
            "relatedEntityType": "ORDER",
            "relatedEntityId": "42"
        }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["id"], 1);
    assert_eq!(json["type"], "EMAIL");
    assert_eq!(json["status"], "SENT");
    assert_eq!(json["attempts"], 1);
    assert_eq!(json["recipient"], "a@x.com");
    assert_eq!(json["relatedEntityType"], "ORDER");
    assert_eq!(json["relatedEntityId"], "42");
    assert!(json["sentAt"].is_string());
}

#[tokio::test]
async fn test_send_failure_still_returns_record() {
    let app = build_test_app();

    let (status, json) = post_json(
        &app,
        "/notifications/send",
        json!({"recipient": "ghost@invalid.test", "subject": "Hi", "body": "B"}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "FAILED");
    assert_eq!(json["attempts"], 1);
    assert!(json["sentAt"].is_null());
    assert!(json["relatedEntityType"].is_null());
    assert!(
        json["errorDetail"]
            .as_str()
            .unwrap()
            .contains("mailbox unavailable")
    );
}

#[tokio::test]
async fn test_send_with_half_related_entity_drops_it() {
    let app = build_test_app();

    let (status, json) = post_json(
        &app,
        "/notifications/send",
        json!({"recipient": "a@x.com", "subject": "Hi", "body": "B", "relatedEntityType": "ORDER"}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert!(json["relatedEntityType"].is_null());
    assert!(json["relatedEntityId"].is_null());
}

#[tokio::test]
async fn test_test_email_endpoint() {
    let app = build_test_app();

    let (status, json) = post_json(
        &app,
        "/notifications/test",
        json!({"recipient": "a@x.com", "name": "Ana"}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "SENT");
    assert_eq!(json["subject"], "🎉 Test Email - E-commerce Notification Service");
    assert!(json["body"].as_str().unwrap().starts_with("Hello Ana!"));
    assert_eq!(json["relatedEntityType"], "TEST");
    assert_eq!(json["relatedEntityId"], "test-001");
}

#[tokio::test]
async fn test_get_by_id() {
    let app = build_test_app();
    let (_, created) = post_json(
        &app,
        "/notifications/send",
        json!({"recipient": "a@x.com", "subject": "Hi", "body": "B"}),
    )
    .await;

    let (status, json) = get(&app, "/notifications/1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json, created);

    let (status, json) = get(&app, "/notifications/999").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"], "Notification not found with id: 999");
}

#[tokio::test]
async fn test_list_queries() {
    let app = build_test_app();
    for (recipient, related_id) in [
        ("a@x.com", Some("42")),
        ("a@x.com", None),
        ("ghost@invalid.test", Some("43")),
    ] {
        let mut body = json!({"recipient": recipient, "subject": "Hi", "body": "B"});
        if let Some(id) = related_id {
            body["relatedEntityType"] = json!("ORDER");
            body["relatedEntityId"] = json!(id);
        }
        let (status, _) = post_json(&app, "/notifications/send", body).await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, all) = get(&app, "/notifications").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(all.as_array().unwrap().len(), 3);

    let (_, by_recipient) = get(&app, "/notifications/recipient/a@x.com").await;
    assert_eq!(by_recipient.as_array().unwrap().len(), 2);

    let (_, failed) = get(&app, "/notifications/status/FAILED").await;
    let failed = failed.as_array().unwrap();
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0]["recipient"], "ghost@invalid.test");

    let (_, sent) = get(&app, "/notifications/status/sent").await;
    assert_eq!(sent.as_array().unwrap().len(), 2);

    let (_, pending) = get(&app, "/notifications/status/PENDING").await;
    assert!(pending.as_array().unwrap().is_empty());

    let (_, related) = get(&app, "/notifications/entity/ORDER/42").await;
    let related = related.as_array().unwrap();
    assert_eq!(related.len(), 1);
    assert_eq!(related[0]["id"], 1);
}

#[tokio::test]
async fn test_unknown_status_is_rejected() {
    let app = build_test_app();

    let (status, json) = get(&app, "/notifications/status/DELIVERED").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().contains("DELIVERED"));
}
