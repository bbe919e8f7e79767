pub mod changes;
pub mod health;
pub mod shared;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// ```text
/// /shared/{id}        published note, no auth
/// /changes            the caller's row changes as server-sent events
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(shared::router())
        .merge(changes::router())
}
