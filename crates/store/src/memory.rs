//! In-process [`Gateway`] that publishes every committed write to a
//! [`ChangeFeed`], the way the PostgreSQL triggers do.
//!
//! Used for embedding without a database and as the test double for the
//! store and the HTTP API. Failures can be injected per operation.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use jotpad_core::category::Category;
use jotpad_core::change::{ChangeEvent, RowChange};
use jotpad_core::error::CoreError;
use jotpad_core::gateway::{Gateway, GatewayResult};
use jotpad_core::note::{Note, NotePatch, SharedNote};
use jotpad_core::types::{EntityId, Timestamp, UserId};
use jotpad_events::ChangeFeed;

use crate::tables::Tables;

/// Gateway operations, for failure injection and call counting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GatewayOp {
    ListCategories,
    FindCategoryByName,
    InsertCategory,
    DeleteCategory,
    ListNotes,
    InsertNote,
    UpdateNote,
    DeleteNote,
    FindSharedNote,
}

#[derive(Default)]
struct Inner {
    tables: Tables,
    failures: HashMap<GatewayOp, CoreError>,
    calls: HashMap<GatewayOp, usize>,
}

#[derive(Default)]
pub struct MemoryGateway {
    inner: Mutex<Inner>,
    feed: Option<Arc<ChangeFeed>>,
}

impl MemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish committed writes to `feed`.
    pub fn with_feed(feed: Arc<ChangeFeed>) -> Self {
        Self {
            inner: Mutex::default(),
            feed: Some(feed),
        }
    }

    /// Make the next call of `op` fail with `err` without touching any row.
    pub fn fail_next(&self, op: GatewayOp, err: CoreError) {
        self.lock().failures.insert(op, err);
    }

    /// How many times `op` has been called, failed calls included.
    pub fn calls(&self, op: GatewayOp) -> usize {
        self.lock().calls.get(&op).copied().unwrap_or(0)
    }

    /// Write a note directly, bypassing the feed. Simulates a row changed
    /// elsewhere whose notification never arrived.
    pub fn put_note(&self, note: Note) {
        let mut inner = self.lock();
        inner.tables.notes.retain(|n| n.id != note.id);
        inner.tables.notes.push(note);
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // A poisoned lock only means a panicking test thread; the tables
        // themselves are never left half-written.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Count the call and take an injected failure, if any.
    fn enter(&self, op: GatewayOp) -> Result<MutexGuard<'_, Inner>, CoreError> {
        let mut inner = self.lock();
        *inner.calls.entry(op).or_default() += 1;
        match inner.failures.remove(&op) {
            Some(err) => {
                tracing::debug!(?op, error = %err, "Injected gateway failure");
                Err(err)
            }
            None => Ok(inner),
        }
    }

    fn publish(&self, event: ChangeEvent) {
        if let Some(feed) = &self.feed {
            feed.publish(event);
        }
    }
}

#[async_trait]
impl Gateway for MemoryGateway {
    async fn list_categories(&self, user_id: UserId) -> GatewayResult<Vec<Category>> {
        let inner = self.enter(GatewayOp::ListCategories)?;
        Ok(inner.tables.list_categories(user_id))
    }

    async fn find_category_by_name(
        &self,
        user_id: UserId,
        name: &str,
    ) -> GatewayResult<Option<Category>> {
        let inner = self.enter(GatewayOp::FindCategoryByName)?;
        Ok(inner.tables.find_category_by_name(user_id, name))
    }

    async fn insert_category(&self, category: &Category) -> GatewayResult<Category> {
        let inserted = self
            .enter(GatewayOp::InsertCategory)?
            .tables
            .insert_category(category)?;
        self.publish(ChangeEvent::Category(RowChange::Inserted(inserted.clone())));
        Ok(inserted)
    }

    async fn delete_category(
        &self,
        user_id: UserId,
        id: EntityId,
        reassign_to: Option<EntityId>,
        stamp: Timestamp,
    ) -> GatewayResult<u64> {
        let moved = self
            .enter(GatewayOp::DeleteCategory)?
            .tables
            .delete_category(user_id, id, reassign_to, stamp)?;

        let count = moved.len() as u64;
        for note in moved {
            self.publish(ChangeEvent::Note(RowChange::Updated(note)));
        }
        self.publish(ChangeEvent::Category(RowChange::Deleted { id, user_id }));
        Ok(count)
    }

    async fn list_notes(&self, user_id: UserId) -> GatewayResult<Vec<Note>> {
        let inner = self.enter(GatewayOp::ListNotes)?;
        Ok(inner.tables.list_notes(user_id))
    }

    async fn insert_note(&self, note: &Note) -> GatewayResult<Note> {
        let inserted = self.enter(GatewayOp::InsertNote)?.tables.insert_note(note)?;
        self.publish(ChangeEvent::Note(RowChange::Inserted(inserted.clone())));
        Ok(inserted)
    }

    async fn update_note(
        &self,
        user_id: UserId,
        id: EntityId,
        patch: &NotePatch,
        stamp: Timestamp,
    ) -> GatewayResult<Note> {
        let updated = self
            .enter(GatewayOp::UpdateNote)?
            .tables
            .update_note(user_id, id, patch, stamp)?;
        self.publish(ChangeEvent::Note(RowChange::Updated(updated.clone())));
        Ok(updated)
    }

    async fn delete_note(&self, user_id: UserId, id: EntityId) -> GatewayResult<bool> {
        let removed = self
            .enter(GatewayOp::DeleteNote)?
            .tables
            .delete_note(user_id, id);
        if removed.is_some() {
            self.publish(ChangeEvent::Note(RowChange::Deleted { id, user_id }));
        }
        Ok(removed.is_some())
    }

    async fn find_shared_note(&self, id: EntityId) -> GatewayResult<Option<SharedNote>> {
        let inner = self.enter(GatewayOp::FindSharedNote)?;
        Ok(inner.tables.find_shared_note(id))
    }
}
