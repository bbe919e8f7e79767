//! The single owner of a [`NoteStore`]: one loop that applies UI intents,
//! autosave writes and realtime changes in turn.

use std::sync::Arc;

use jotpad_core::note::Note;
use jotpad_core::session::UserSession;
use jotpad_core::types::EntityId;
use jotpad_events::{ChangeFeed, ChangeStream, FeedItem};

use crate::auth::{verify_access_token, JwtConfig};
use crate::autosave::{AutosaveCoordinator, FieldEdit, PendingWrite};
use crate::error::StoreError;
use crate::store::NoteStore;

/// What [`Workspace::step`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Wake {
    /// A debounced autosave write was issued for this note.
    Saved(EntityId),
    /// A change-feed item was applied.
    Synced,
    /// The change feed went away; realtime updates have stopped.
    FeedClosed,
}

pub struct Workspace {
    store: NoteStore,
    autosave: AutosaveCoordinator,
    feed: Option<Arc<ChangeFeed>>,
    changes: Option<ChangeStream>,
}

impl Workspace {
    pub fn new(
        store: NoteStore,
        autosave: AutosaveCoordinator,
        feed: Option<Arc<ChangeFeed>>,
    ) -> Self {
        Self {
            store,
            autosave,
            feed,
            changes: None,
        }
    }

    pub fn store(&self) -> &NoteStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut NoteStore {
        &mut self.store
    }

    pub fn autosave(&self) -> &AutosaveCoordinator {
        &self.autosave
    }

    // -----------------------------------------------------------------------
    // Session
    // -----------------------------------------------------------------------

    /// Subscribe to the user's changes, then load their data.
    ///
    /// Subscribing first means nothing committed after the fetch is missed.
    pub async fn sign_in(&mut self, session: UserSession) -> Result<(), StoreError> {
        self.flush().await;
        self.autosave.discard();
        self.changes = self.feed.as_ref().map(|f| f.subscribe(session.user_id));
        self.store.load(Some(session)).await
    }

    /// Verify an access token and sign in as its subject.
    pub async fn sign_in_with_token(
        &mut self,
        token: &str,
        config: &JwtConfig,
    ) -> Result<(), StoreError> {
        match verify_access_token(token, config) {
            Ok(session) => self.sign_in(session).await,
            Err(e) => {
                self.store.notifier().error("Sign-in failed", &e);
                Err(e)
            }
        }
    }

    pub async fn sign_out(&mut self) {
        self.flush().await;
        self.autosave.discard();
        self.changes = None;
        // Clearing cannot fail.
        let _ = self.store.load(None).await;
    }

    // -----------------------------------------------------------------------
    // Editor intents
    // -----------------------------------------------------------------------

    /// Open a note in the editor, saving the previous one's pending edits.
    pub async fn open_note(&mut self, id: EntityId) -> Option<&Note> {
        if let Some(write) = self.autosave.open(id) {
            self.commit(write).await;
        }
        self.store.select_note(Some(id))
    }

    /// Close the editor, saving pending edits.
    pub async fn close_note(&mut self) {
        if let Some(write) = self.autosave.close() {
            self.commit(write).await;
        }
        self.store.select_note(None);
    }

    /// Record an edit to the open note; it is saved once edits pause.
    pub fn edit(&mut self, edit: FieldEdit) {
        self.autosave.edit(edit);
    }

    /// Create a note and open it.
    pub async fn create_note(&mut self, category_id: Option<EntityId>) -> Result<Note, StoreError> {
        self.flush().await;
        let note = self.store.create_note(category_id).await?;
        self.autosave.open(note.id);
        Ok(note)
    }

    /// Delete a note, dropping unsaved edits to it.
    pub async fn delete_note(&mut self, id: EntityId) -> Result<(), StoreError> {
        if self.autosave.note_id() == Some(id) {
            self.autosave.discard();
        }
        self.store.delete_note(id).await
    }

    /// Issue the pending autosave write now, if any.
    pub async fn flush(&mut self) {
        if let Some(write) = self.autosave.flush() {
            self.commit(write).await;
        }
    }

    // -----------------------------------------------------------------------
    // Event loop
    // -----------------------------------------------------------------------

    /// Wait for the next autosave deadline or feed item and handle it.
    pub async fn step(&mut self) -> Wake {
        tokio::select! {
            write = self.autosave.next_due() => {
                let note_id = write.note_id;
                self.commit(write).await;
                Wake::Saved(note_id)
            }
            item = next_item(&mut self.changes) => match item {
                Some(item) => {
                    // Failures are already reported by the store.
                    let _ = self.store.apply_feed_item(item).await;
                    self.close_if_gone();
                    Wake::Synced
                }
                None => {
                    tracing::warn!("Change feed closed, realtime updates stopped");
                    self.changes = None;
                    Wake::FeedClosed
                }
            },
        }
    }

    /// Drop the open note's pending edits once it left the cache, e.g.
    /// deleted on another device.
    fn close_if_gone(&mut self) {
        if let Some(id) = self.autosave.note_id() {
            if self.store.note(id).is_none() {
                tracing::info!(note_id = %id, "Open note was removed, dropping unsaved edits");
                self.autosave.discard();
            }
        }
    }

    async fn commit(&mut self, write: PendingWrite) {
        tracing::debug!(note_id = %write.note_id, "Autosaving note");
        // Failures are already reported by the store.
        let _ = self.store.update_note(write.note_id, write.patch).await;
    }
}

/// Next feed item, or pend forever without a subscription.
async fn next_item(changes: &mut Option<ChangeStream>) -> Option<FeedItem> {
    match changes {
        Some(stream) => stream.next().await,
        None => std::future::pending().await,
    }
}
