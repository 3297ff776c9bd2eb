//! Notification dispatch: one delivery attempt, one stored record.

pub mod record;
pub mod service;
pub mod store;
pub mod templates;
