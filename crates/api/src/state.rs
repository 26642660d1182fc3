use std::sync::Arc;

use campusign_core::compose::CompositionEngine;
use campusign_db::store::PgStore;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: campusign_db::DbPool,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// The display composition engine, holding the template registry and
    /// the Postgres-backed storage adapter.
    pub engine: Arc<CompositionEngine<PgStore>>,
}
