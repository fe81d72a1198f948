//! Application state for Campus Hub.
//!
//! Contains the shared state that is passed to all handlers.

use crate::db::DbPool;
use crate::services::AuthService;
use crate::{config, Result};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub db: DbPool,
    /// Authentication service (password hashing + JWT).
    pub auth: AuthService,
}

impl AppState {
    /// Create a new application state, initializing the database.
    pub async fn new() -> Result<Self> {
        let config = config::config();

        let db = crate::db::init_pool(&config.database.path).await?;
        crate::db::initialize_schema(&db).await?;

        Ok(Self {
            auth: AuthService::new(config.auth.clone()),
            db,
        })
    }

    /// Create state over an existing pool (used by tests with in-memory
    /// databases and throwaway secrets).
    pub fn with_pool(db: DbPool, auth: AuthService) -> Self {
        Self { db, auth }
    }
}
