//! In-process change feed backed by a `tokio::sync::broadcast` channel.
//!
//! [`ChangeFeed`] is shared via `Arc<ChangeFeed>` between whatever produces
//! row changes (a database listener, an in-memory gateway) and the stores
//! that consume them.

use jotpad_core::change::ChangeEvent;
use jotpad_core::types::UserId;
use tokio::sync::broadcast;

// ---------------------------------------------------------------------------
// FeedItem
// ---------------------------------------------------------------------------

/// What a subscriber receives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedItem {
    Change(ChangeEvent),
    /// Events may have been missed; the subscriber should re-fetch
    /// authoritative state.
    Resync,
}

// ---------------------------------------------------------------------------
// ChangeFeed
// ---------------------------------------------------------------------------

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 1024;

/// Fan-out hub for row changes of all users.
pub struct ChangeFeed {
    sender: broadcast::Sender<FeedItem>,
}

impl ChangeFeed {
    /// Create a feed with a specific channel capacity.
    ///
    /// Slow subscribers that fall more than `capacity` items behind are
    /// told to resync instead of silently missing changes.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish a change to all current subscribers.
    pub fn publish(&self, event: ChangeEvent) {
        tracing::trace!(
            table = event.table(),
            op = event.op(),
            row_id = %event.row_id(),
            "Publishing change"
        );
        // A SendError only means there are no subscribers.
        let _ = self.sender.send(FeedItem::Change(event));
    }

    /// Ask every subscriber to re-fetch (e.g. after the source reconnected).
    pub fn publish_resync(&self) {
        let _ = self.sender.send(FeedItem::Resync);
    }

    /// Subscribe to the changes of one user's rows.
    pub fn subscribe(&self, user_id: UserId) -> ChangeStream {
        ChangeStream {
            user_id,
            receiver: self.sender.subscribe(),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for ChangeFeed {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

// ---------------------------------------------------------------------------
// ChangeStream
// ---------------------------------------------------------------------------

/// A subscription scoped to one owner.
pub struct ChangeStream {
    user_id: UserId,
    receiver: broadcast::Receiver<FeedItem>,
}

impl ChangeStream {
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    /// Next item for this user, or `None` once the feed is dropped.
    ///
    /// Cancel-safe, so it can sit in a `tokio::select!` loop.
    pub async fn next(&mut self) -> Option<FeedItem> {
        loop {
            match self.receiver.recv().await {
                Ok(FeedItem::Change(event)) if event.owner() == self.user_id => {
                    return Some(FeedItem::Change(event));
                }
                Ok(FeedItem::Change(_)) => continue,
                Ok(FeedItem::Resync) => return Some(FeedItem::Resync),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(
                        skipped,
                        user_id = %self.user_id,
                        "Change stream lagged, requesting resync"
                    );
                    return Some(FeedItem::Resync);
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
