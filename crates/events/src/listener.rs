//! PostgreSQL `LISTEN`/`NOTIFY` bridge into the [`ChangeFeed`].
//!
//! Row triggers (see the `change_notifications` migration) send a small JSON
//! payload naming the table, operation, row id and owner. Inserts and
//! updates are re-read so subscribers get the full row; deletes are
//! forwarded as-is.

use std::sync::Arc;
use std::time::Duration;

use jotpad_core::category::Category;
use jotpad_core::change::{ChangeEvent, RowChange};
use jotpad_core::note::Note;
use jotpad_core::types::{EntityId, UserId};
use jotpad_db::repositories::{CategoryRepo, NoteRepo};
use jotpad_db::DbPool;
use serde::Deserialize;
use sqlx::postgres::PgListener;
use tokio_util::sync::CancellationToken;

use crate::feed::ChangeFeed;

/// Channel the row triggers notify on.
pub const NOTIFY_CHANNEL: &str = "jotpad_changes";

/// Payload sent by the `notify_row_change()` trigger.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RowNotification {
    pub table: String,
    pub op: String,
    pub id: EntityId,
    pub user_id: UserId,
}

impl RowNotification {
    pub fn parse(payload: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(payload)
    }

    /// The event for a delete notification; `None` for other operations or
    /// unknown tables.
    pub fn delete_event(&self) -> Option<ChangeEvent> {
        if self.op != "delete" {
            return None;
        }
        let (id, user_id) = (self.id, self.user_id);
        match self.table.as_str() {
            "notes" => Some(ChangeEvent::Note(RowChange::Deleted { id, user_id })),
            "categories" => Some(ChangeEvent::Category(RowChange::Deleted { id, user_id })),
            _ => None,
        }
    }
}

/// Delay before the first reconnect attempt after the listener fails.
const INITIAL_BACKOFF: Duration = Duration::from_secs(1);

/// Upper bound for the reconnect delay.
const MAX_BACKOFF: Duration = Duration::from_secs(30);

/// Background service that forwards database row changes to a feed.
pub struct PgChangeListener;

impl PgChangeListener {
    /// Run the listen loop until `cancel` fires.
    ///
    /// Short connection losses are retried by [`PgListener`] itself. If the
    /// listener fails outright (e.g. the database is down when it tries to
    /// reconnect) it is rebuilt after a growing delay. Notifications sent
    /// while disconnected are gone, so every reconnect is followed by a
    /// resync request on the feed.
    pub async fn run(pool: DbPool, feed: Arc<ChangeFeed>, cancel: CancellationToken) {
        let mut backoff = INITIAL_BACKOFF;
        let mut recovering = false;

        loop {
            let connected = tokio::select! {
                () = cancel.cancelled() => break,
                connected = Self::connect(&pool) => connected,
            };

            match connected {
                Ok(mut listener) => {
                    tracing::info!(channel = NOTIFY_CHANNEL, "Listening for row changes");
                    if recovering {
                        feed.publish_resync();
                    }
                    backoff = INITIAL_BACKOFF;

                    match Self::forward_all(&pool, &feed, &mut listener, &cancel).await {
                        Ok(()) => break,
                        Err(e) => tracing::error!(error = %e, "Change listener failed"),
                    }
                }
                Err(e) => {
                    tracing::error!(error = %e, "Change listener could not connect");
                }
            }

            recovering = true;
            tracing::warn!(retry_in_secs = backoff.as_secs(), "Restarting change listener");
            if !wait_or_cancelled(backoff, &cancel).await {
                break;
            }
            backoff = next_backoff(backoff);
        }

        tracing::info!("Change listener shutting down");
    }

    async fn connect(pool: &DbPool) -> Result<PgListener, sqlx::Error> {
        let mut listener = PgListener::connect_with(pool).await?;
        listener.listen(NOTIFY_CHANNEL).await?;
        Ok(listener)
    }

    /// Forward notifications until `cancel` fires (`Ok`) or the listener
    /// gives up (`Err`).
    async fn forward_all(
        pool: &DbPool,
        feed: &ChangeFeed,
        listener: &mut PgListener,
        cancel: &CancellationToken,
    ) -> Result<(), sqlx::Error> {
        loop {
            tokio::select! {
                () = cancel.cancelled() => return Ok(()),
                received = listener.try_recv() => match received? {
                    Some(notification) => {
                        Self::forward(pool, feed, notification.payload()).await;
                    }
                    None => {
                        tracing::warn!("Change listener connection lost, reconnecting");
                        feed.publish_resync();
                    }
                },
            }
        }
    }

    async fn forward(pool: &DbPool, feed: &ChangeFeed, payload: &str) {
        let notification = match RowNotification::parse(payload) {
            Ok(n) => n,
            Err(e) => {
                tracing::warn!(error = %e, payload, "Ignoring malformed change notification");
                return;
            }
        };

        match Self::resolve(pool, &notification).await {
            Ok(Some(event)) => feed.publish(event),
            Ok(None) => {
                tracing::debug!(
                    table = %notification.table,
                    op = %notification.op,
                    row_id = %notification.id,
                    "Row vanished before it could be read, skipping"
                );
            }
            Err(e) => {
                tracing::error!(error = %e, row_id = %notification.id, "Failed to read changed row");
                feed.publish_resync();
            }
        }
    }

    /// Turn a notification into a full event, re-reading inserted/updated
    /// rows. `Ok(None)` if the row no longer exists or the table is unknown.
    async fn resolve(
        pool: &DbPool,
        n: &RowNotification,
    ) -> Result<Option<ChangeEvent>, sqlx::Error> {
        if let Some(event) = n.delete_event() {
            return Ok(Some(event));
        }

        let inserted = match n.op.as_str() {
            "insert" => true,
            "update" => false,
            _ => return Ok(None),
        };

        match n.table.as_str() {
            "notes" => {
                let row = NoteRepo::find_by_id(pool, n.user_id, n.id).await?;
                Ok(row.map(|row| {
                    let note = Note::from(row);
                    ChangeEvent::Note(if inserted {
                        RowChange::Inserted(note)
                    } else {
                        RowChange::Updated(note)
                    })
                }))
            }
            "categories" => {
                let mut conn = pool.acquire().await?;
                let row = CategoryRepo::find_by_id(&mut conn, n.user_id, n.id).await?;
                Ok(row.map(|row| {
                    let category = Category::from(row);
                    ChangeEvent::Category(if inserted {
                        RowChange::Inserted(category)
                    } else {
                        RowChange::Updated(category)
                    })
                }))
            }
            _ => Ok(None),
        }
    }
}

fn next_backoff(current: Duration) -> Duration {
    (current * 2).min(MAX_BACKOFF)
}

/// Sleep for `delay`; `false` if `cancel` fired first.
async fn wait_or_cancelled(delay: Duration, cancel: &CancellationToken) -> bool {
    tokio::select! {
        () = cancel.cancelled() => false,
        () = tokio::time::sleep(delay) => true,
    }
}
