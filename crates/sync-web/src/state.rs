//! Application state shared across handlers.

use std::sync::Arc;

use database::Database;
use sync_engine::SyncService;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Database connection.
    pub db: Database,
    /// Background sync trigger and status.
    pub sync: Arc<SyncService>,
}

impl AppState {
    /// Create new application state.
    pub fn new(db: Database, sync: Arc<SyncService>) -> Self {
        Self { db, sync }
    }
}
