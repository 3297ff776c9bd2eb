//! HTTP adapter over the dispatch service.
//!
//! Endpoints:
//! - POST /notifications/test — send the canned test e-mail
//! - POST /notifications/send — send an arbitrary e-mail
//! - GET  /notifications — full history
//! - GET  /notifications/{id} — single record
//! - GET  /notifications/recipient/{email}
//! - GET  /notifications/status/{status}
//! - GET  /notifications/entity/{entity_type}/{entity_id}
//! - GET  /health

pub mod routes;
pub mod state;
