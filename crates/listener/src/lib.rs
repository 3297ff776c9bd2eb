//! Queue adapter: consumes notification events and dispatches them.
//!
//! Delivery policy is at-most-once. Every event is acknowledged after a
//! single handling attempt, whatever the outcome: malformed payloads and
//! failed dispatches are logged and dropped, never requeued or dead-lettered.

pub mod consumer;
pub mod handler;
