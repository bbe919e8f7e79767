//! Realtime change feed for jotpad.
//!
//! - [`ChangeFeed`] - in-process publish/subscribe hub backed by
//!   `tokio::sync::broadcast`, handing out per-user [`ChangeStream`]s.
//! - [`PgChangeListener`] - background service that turns PostgreSQL
//!   `NOTIFY` messages into [`ChangeEvent`](jotpad_core::change::ChangeEvent)s
//!   on the feed.

pub mod feed;
pub mod listener;

pub use feed::{ChangeFeed, ChangeStream, FeedItem};
pub use listener::{PgChangeListener, RowNotification, NOTIFY_CHANNEL};
