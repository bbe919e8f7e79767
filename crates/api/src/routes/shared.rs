//! Read-only access to published notes.
//!
//! No authentication: anyone with the link can read a note while its public
//! flag is set. Unknown, private and malformed ids all get the same 404 so
//! the response reveals nothing about private notes.

use axum::extract::{Path, State};
use axum::{routing::get, Json, Router};
use jotpad_core::note::SharedNote;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

const NOT_SHARED: &str = "Note not found or not public";

/// GET /shared/{id}
async fn get_shared_note(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<DataResponse<SharedNote>>> {
    let Ok(id) = Uuid::parse_str(&id) else {
        return Err(AppError::NotFound(NOT_SHARED.to_string()));
    };

    let note = state
        .gateway
        .find_shared_note(id)
        .await?
        .ok_or_else(|| AppError::NotFound(NOT_SHARED.to_string()))?;

    tracing::debug!(note_id = %id, "Serving shared note");
    Ok(Json(DataResponse { data: note }))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/shared/{id}", get(get_shared_note))
}
