#![allow(dead_code)]

use std::sync::Arc;

use jotpad_core::session::UserSession;
use jotpad_events::ChangeFeed;
use jotpad_store::{
    MemoryGateway, Notification, Notifier, NoteStore, StoreConfig, WriteMode,
};
use tokio::sync::broadcast;

pub struct Harness {
    pub store: NoteStore,
    pub gateway: Arc<MemoryGateway>,
    pub notifications: broadcast::Receiver<Notification>,
    pub session: UserSession,
}

impl Harness {
    /// Everything received so far.
    pub fn drain_notifications(&mut self) -> Vec<Notification> {
        let mut received = Vec::new();
        while let Ok(n) = self.notifications.try_recv() {
            received.push(n);
        }
        received
    }
}

pub fn session() -> UserSession {
    UserSession::new(uuid::Uuid::new_v4()).with_email("ada@example.com")
}

pub fn harness_with(mode: WriteMode, gateway: Arc<MemoryGateway>) -> Harness {
    let config = StoreConfig {
        write_mode: mode,
        ..StoreConfig::default()
    };
    let notifier = Notifier::default();
    let notifications = notifier.subscribe();
    Harness {
        store: NoteStore::new(gateway.clone(), &config, notifier),
        gateway,
        notifications,
        session: session(),
    }
}

pub fn harness(mode: WriteMode) -> Harness {
    harness_with(mode, Arc::new(MemoryGateway::new()))
}

/// A harness already signed in, with the default categories loaded.
pub async fn loaded(mode: WriteMode) -> Harness {
    let mut h = harness(mode);
    h.store.load(Some(h.session.clone())).await.unwrap();
    h.drain_notifications();
    h
}

pub fn feed_gateway() -> (Arc<ChangeFeed>, Arc<MemoryGateway>) {
    let feed = Arc::new(ChangeFeed::default());
    let gateway = Arc::new(MemoryGateway::with_feed(feed.clone()));
    (feed, gateway)
}
