use std::sync::Arc;

use crate::config::ServerConfig;
use crate::mailer::Mailer;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: memex_db::DbPool,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Outbound account mail (activation codes).
    pub mailer: Arc<dyn Mailer>,
}
