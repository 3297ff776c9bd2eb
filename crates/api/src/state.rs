//! Shared application state for the Axum API server.

use herald_dispatch::service::DispatchService;

/// Application state shared across all route handlers via Axum `State`.
#[derive(Clone)]
pub struct AppState {
    pub notifications: DispatchService,
}

impl AppState {
    pub fn new(notifications: DispatchService) -> Self {
        Self { notifications }
    }
}
