//! The caller's row changes as a server-sent event stream.
//!
//! Each change is a `change` event whose data is the JSON-encoded
//! [`ChangeEvent`](jotpad_core::change::ChangeEvent). A `resync` event means
//! changes may have been missed and the client should re-fetch.

use std::convert::Infallible;

use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::{routing::get, Router};
use futures::stream::{self, Stream, StreamExt};
use jotpad_events::FeedItem;

use crate::middleware::auth::AuthUser;
use crate::state::AppState;

/// GET /changes
async fn stream_changes(
    State(state): State<AppState>,
    AuthUser(session): AuthUser,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    tracing::info!(user_id = %session.user_id, "Change stream opened");
    let changes = state.feed.subscribe(session.user_id);

    let events = stream::unfold(changes, |mut changes| async move {
        let item = changes.next().await?;
        Some((Ok(to_event(item)), changes))
    })
    .take_until(state.shutdown.clone().cancelled_owned());

    Sse::new(events).keep_alive(KeepAlive::default())
}

fn to_event(item: FeedItem) -> Event {
    match item {
        FeedItem::Change(change) => Event::default()
            .event("change")
            .json_data(&change)
            .unwrap_or_else(|e| {
                // The client can recover by re-fetching.
                tracing::error!(error = %e, "Failed to encode change event");
                resync_event()
            }),
        FeedItem::Resync => resync_event(),
    }
}

fn resync_event() -> Event {
    Event::default().event("resync").data("{}")
}

pub fn router() -> Router<AppState> {
    Router::new().route("/changes", get(stream_changes))
}
