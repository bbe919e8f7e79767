use std::sync::Arc;

use jotpad_core::gateway::Gateway;
use jotpad_events::ChangeFeed;
use tokio_util::sync::CancellationToken;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Row storage. `PgGateway` in production.
    pub gateway: Arc<dyn Gateway>,
    /// Database pool for health checks; `None` for backends without one.
    pub pool: Option<jotpad_db::DbPool>,
    /// Row changes of all users, fanned out to change-stream subscribers.
    pub feed: Arc<ChangeFeed>,
    pub config: Arc<ServerConfig>,
    /// Cancelled when the server shuts down; ends open change streams.
    pub shutdown: CancellationToken,
}
