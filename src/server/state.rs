//! Server state shared across handlers.

use std::sync::Arc;

use super::registry::ConnectionRegistry;

/// Shared application state
pub struct AppState {
    /// Registry of all currently connected clients
    pub registry: Arc<ConnectionRegistry>,
}

impl AppState {
    pub fn new(registry: Arc<ConnectionRegistry>) -> Self {
        Self { registry }
    }
}
