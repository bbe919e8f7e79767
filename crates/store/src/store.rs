//! The signed-in user's note/category cache and every mutation of it.
//!
//! [`NoteStore`] is owned by a single task and mutated through `&mut self`,
//! so operations never interleave with each other. Between operations the
//! owner feeds in realtime [`ChangeEvent`]s, which are reconciled by
//! `updated_at`: an event never replaces a cached note that is newer.
//!
//! Public operations report each failure exactly once on the [`Notifier`]
//! and also return it; the `try_*` internals never notify.

use std::collections::HashSet;
use std::sync::Arc;

use jotpad_core::category::{default_categories, validate_new_category, Category, NewCategory};
use jotpad_core::change::{ChangeEvent, RowChange};
use jotpad_core::error::CoreError;
use jotpad_core::gateway::Gateway;
use jotpad_core::note::{validate_patch, Note, NotePatch};
use jotpad_core::session::UserSession;
use jotpad_core::types::{next_stamp, now, EntityId, Timestamp, UserId};
use jotpad_core::view::{visible_notes, NoteFilter};
use jotpad_events::FeedItem;

use crate::config::{StoreConfig, WriteMode};
use crate::error::StoreError;
use crate::notify::Notifier;

pub struct NoteStore {
    gateway: Arc<dyn Gateway>,
    notifier: Notifier,
    write_mode: WriteMode,
    share_base_url: String,

    session: Option<UserSession>,
    /// Newest first as far as inserts go; display order comes from
    /// [`visible_notes`].
    notes: Vec<Note>,
    categories: Vec<Category>,
    /// Ids deleted while signed in. Late events for them are ignored.
    tombstones: HashSet<EntityId>,

    active_note: Option<EntityId>,
    filter: NoteFilter,
}

impl NoteStore {
    pub fn new(gateway: Arc<dyn Gateway>, config: &StoreConfig, notifier: Notifier) -> Self {
        Self {
            gateway,
            notifier,
            write_mode: config.write_mode,
            share_base_url: config.share_base_url.clone(),
            session: None,
            notes: Vec::new(),
            categories: Vec::new(),
            tombstones: HashSet::new(),
            active_note: None,
            filter: NoteFilter::default(),
        }
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    pub fn session(&self) -> Option<&UserSession> {
        self.session.as_ref()
    }

    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    pub fn write_mode(&self) -> WriteMode {
        self.write_mode
    }

    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn note(&self, id: EntityId) -> Option<&Note> {
        self.notes.iter().find(|n| n.id == id)
    }

    pub fn category(&self, id: EntityId) -> Option<&Category> {
        self.categories.iter().find(|c| c.id == id)
    }

    /// The selected note as currently cached, so always its latest stamp.
    pub fn active_note(&self) -> Option<&Note> {
        self.active_note.and_then(|id| self.note(id))
    }

    pub fn filter(&self) -> &NoteFilter {
        &self.filter
    }

    /// Notes passing the current search and category filter, pinned first,
    /// then most recently updated.
    pub fn visible_notes(&self) -> Vec<&Note> {
        visible_notes(&self.notes, &self.filter)
    }

    /// Public link of a published note; `None` while it is private.
    pub fn share_url(&self, id: EntityId) -> Option<String> {
        self.note(id)
            .filter(|n| n.is_public)
            .map(|n| n.share_url(&self.share_base_url))
    }

    // -----------------------------------------------------------------------
    // Selection
    // -----------------------------------------------------------------------

    /// Select a cached note, or clear the selection. Unknown ids clear it.
    pub fn select_note(&mut self, id: Option<EntityId>) -> Option<&Note> {
        self.active_note = id.filter(|id| self.note(*id).is_some());
        self.active_note()
    }

    pub fn set_search(&mut self, search: impl Into<String>) {
        self.filter.search = search.into();
    }

    /// Narrow to one category, or `None` for all. Unknown ids mean all.
    pub fn set_category_filter(&mut self, category: Option<EntityId>) {
        self.filter.category = category.filter(|id| self.category(*id).is_some());
    }

    // -----------------------------------------------------------------------
    // Loading
    // -----------------------------------------------------------------------

    /// Load `session`'s categories and notes, seeding the default
    /// categories for a user who has none. `None` signs out and clears
    /// everything.
    ///
    /// On failure the cache keeps its last known-good state.
    pub async fn load(&mut self, session: Option<UserSession>) -> Result<(), StoreError> {
        let Some(session) = session else {
            self.clear();
            tracing::info!("Signed out, store cleared");
            return Ok(());
        };
        let result = self.try_load(session).await;
        self.report("Error loading data", result)
    }

    /// Re-fetch authoritative state for the current session.
    pub async fn refresh(&mut self) -> Result<(), StoreError> {
        let result = self.try_refresh().await;
        self.report("Error loading data", result)
    }

    async fn try_load(&mut self, session: UserSession) -> Result<(), StoreError> {
        let switching = self.session.as_ref().map(|s| s.user_id) != Some(session.user_id);
        if switching {
            // Another user's rows are never a "known-good" state.
            self.clear();
        }
        let user_id = session.user_id;
        self.session = Some(session);
        self.try_refresh().await?;
        tracing::info!(
            user_id = %user_id,
            notes = self.notes.len(),
            categories = self.categories.len(),
            "Store loaded"
        );
        Ok(())
    }

    async fn try_refresh(&mut self) -> Result<(), StoreError> {
        let user_id = self.user_id()?;
        let mut categories = self.gateway.list_categories(user_id).await?;
        if categories.is_empty() {
            self.seed_default_categories(user_id).await?;
            categories = self.gateway.list_categories(user_id).await?;
        }
        let notes = self.gateway.list_notes(user_id).await?;
        self.install(categories, notes);
        Ok(())
    }

    /// Insert the default categories. A conflict means another session got
    /// there first, which is fine as long as the row can be found.
    async fn seed_default_categories(&self, user_id: UserId) -> Result<(), StoreError> {
        for category in default_categories(user_id) {
            match self.gateway.insert_category(&category).await {
                Ok(_) => {}
                Err(CoreError::Conflict(_)) => {
                    self.gateway
                        .find_category_by_name(user_id, &category.name)
                        .await?
                        .ok_or_else(|| {
                            CoreError::Internal(format!(
                                "Category '{}' conflicted but does not exist",
                                category.name
                            ))
                        })?;
                    tracing::debug!(name = %category.name, "Default category already present");
                }
                Err(e) => return Err(e.into()),
            }
        }
        tracing::info!(user_id = %user_id, "Default categories created");
        Ok(())
    }

    /// Silent re-fetch after a failed write. The write's own failure has
    /// already been reported.
    async fn resync_quietly(&mut self) {
        if let Err(e) = self.try_refresh().await {
            tracing::warn!(error = %e, "Re-fetch after failed write also failed");
        }
    }

    fn install(&mut self, categories: Vec<Category>, notes: Vec<Note>) {
        self.categories = categories;
        self.notes = notes
            .into_iter()
            .filter(|n| !self.tombstones.contains(&n.id))
            .collect();
        if self.active_note().is_none() {
            self.active_note = None;
        }
        let category = self.filter.category;
        self.set_category_filter(category);
    }

    fn clear(&mut self) {
        self.session = None;
        self.notes.clear();
        self.categories.clear();
        self.tombstones.clear();
        self.active_note = None;
        self.filter = NoteFilter::default();
    }

    // -----------------------------------------------------------------------
    // Notes
    // -----------------------------------------------------------------------

    /// Create an empty note in `category_id` (or the first category) and
    /// select it.
    pub async fn create_note(&mut self, category_id: Option<EntityId>) -> Result<Note, StoreError> {
        let result = self.try_create_note(category_id).await;
        self.report("Error creating note", result)
    }

    /// Merge `patch` into the note, stamping a fresh `updated_at`.
    pub async fn update_note(&mut self, id: EntityId, patch: NotePatch) -> Result<Note, StoreError> {
        let result = self.try_update_note(id, patch).await;
        self.report("Error updating note", result)
    }

    /// Delete a note. Deleting a note that is already gone succeeds.
    pub async fn delete_note(&mut self, id: EntityId) -> Result<(), StoreError> {
        let result = self.try_delete_note(id).await;
        if self.write_mode == WriteMode::Confirmed {
            self.resync_after_remote_failure(&result).await;
        }
        self.report("Error deleting note", result)
    }

    pub async fn toggle_pinned(&mut self, id: EntityId) -> Result<Note, StoreError> {
        let result = match self.note(id) {
            Some(note) => {
                let patch = NotePatch::default().with_pinned(!note.is_pinned);
                self.try_update_note(id, patch).await
            }
            None => Err(StoreError::NoteNotFound(id)),
        };
        if self.write_mode == WriteMode::Confirmed {
            self.resync_after_remote_failure(&result).await;
        }
        self.report("Error updating note", result)
    }

    /// Publish or unpublish a note.
    pub async fn set_public(&mut self, id: EntityId, public: bool) -> Result<Note, StoreError> {
        let result = self
            .try_update_note(id, NotePatch::default().with_public(public))
            .await;
        let note = self.report("Error updating sharing settings", result)?;
        self.notifier.success(if public {
            "Note is now public and can be shared"
        } else {
            "Note is now private"
        });
        Ok(note)
    }

    async fn try_create_note(&mut self, category_id: Option<EntityId>) -> Result<Note, StoreError> {
        let user_id = self.user_id()?;
        let category_id = match category_id {
            Some(id) => self.require_category(id)?,
            None => self
                .categories
                .first()
                .map(|c| c.id)
                .ok_or(StoreError::NoCategoryAvailable)?,
        };

        let note = Note::new(user_id, Some(category_id));
        let id = note.id;

        match self.write_mode {
            WriteMode::Optimistic => {
                self.notes.insert(0, note.clone());
                self.active_note = Some(id);
                match self.gateway.insert_note(&note).await {
                    Ok(stored) => {
                        self.merge_note(stored);
                    }
                    Err(e) => {
                        self.notes.retain(|n| n.id != id);
                        if self.active_note == Some(id) {
                            self.active_note = None;
                        }
                        self.resync_quietly().await;
                        return Err(e.into());
                    }
                }
            }
            WriteMode::Confirmed => {
                let stored = self.gateway.insert_note(&note).await?;
                self.merge_note(stored);
                self.active_note = Some(id);
            }
        }

        tracing::info!(note_id = %id, user_id = %user_id, "Note created");
        self.note(id).cloned().ok_or(StoreError::NoteNotFound(id))
    }

    async fn try_update_note(&mut self, id: EntityId, patch: NotePatch) -> Result<Note, StoreError> {
        let user_id = self.user_id()?;
        validate_patch(&patch).map_err(StoreError::Invalid)?;
        if let Some(Some(category_id)) = patch.category_id {
            self.require_category(category_id)?;
        }
        let previous = self.note(id).cloned().ok_or(StoreError::NoteNotFound(id))?;
        if patch.is_empty() {
            return Ok(previous);
        }
        let stamp = next_stamp(previous.updated_at);

        match self.write_mode {
            WriteMode::Optimistic => {
                if let Some(cached) = self.note_mut(id) {
                    cached.apply(&patch, stamp);
                }
                match self.gateway.update_note(user_id, id, &patch, stamp).await {
                    Ok(stored) => {
                        self.merge_note(stored);
                    }
                    Err(e) => {
                        if let Some(cached) = self.note_mut(id) {
                            if cached.updated_at == stamp {
                                *cached = previous;
                            }
                        }
                        self.resync_quietly().await;
                        return Err(e.into());
                    }
                }
            }
            WriteMode::Confirmed => {
                let stored = self.gateway.update_note(user_id, id, &patch, stamp).await?;
                self.merge_note(stored);
            }
        }

        tracing::debug!(note_id = %id, updated_at = %stamp, "Note updated");
        self.note(id).cloned().ok_or(StoreError::NoteNotFound(id))
    }

    async fn try_delete_note(&mut self, id: EntityId) -> Result<(), StoreError> {
        let user_id = self.user_id()?;

        match self.write_mode {
            WriteMode::Optimistic => {
                let was_active = self.active_note == Some(id);
                let removed = self.forget_note(id);
                if let Err(e) = self.gateway.delete_note(user_id, id).await {
                    self.tombstones.remove(&id);
                    if let Some(note) = removed {
                        self.notes.insert(0, note);
                        if was_active && self.active_note.is_none() {
                            self.active_note = Some(id);
                        }
                    }
                    self.resync_quietly().await;
                    return Err(e.into());
                }
            }
            WriteMode::Confirmed => {
                self.gateway.delete_note(user_id, id).await?;
                self.forget_note(id);
            }
        }

        tracing::info!(note_id = %id, user_id = %user_id, "Note deleted");
        Ok(())
    }

    async fn resync_after_remote_failure<T>(&mut self, result: &Result<T, StoreError>) {
        if matches!(result, Err(StoreError::Remote(_))) {
            self.resync_quietly().await;
        }
    }

    // -----------------------------------------------------------------------
    // Categories
    // -----------------------------------------------------------------------

    /// Create a category. A name already in the cache is rejected without a
    /// remote call.
    pub async fn create_category(
        &mut self,
        name: &str,
        color: Option<&str>,
    ) -> Result<Category, StoreError> {
        let result = self.try_create_category(name, color).await;
        self.report("Error creating category", result)
    }

    /// Delete a category, moving its notes to `reassign_to` (or leaving them
    /// uncategorized). The last remaining category cannot be deleted.
    pub async fn delete_category(
        &mut self,
        id: EntityId,
        reassign_to: Option<EntityId>,
    ) -> Result<u64, StoreError> {
        let result = self.try_delete_category(id, reassign_to).await;
        self.report("Error deleting category", result)
    }

    async fn try_create_category(
        &mut self,
        name: &str,
        color: Option<&str>,
    ) -> Result<Category, StoreError> {
        let user_id = self.user_id()?;
        let input = NewCategory::new(name, color);
        validate_new_category(&input).map_err(StoreError::Invalid)?;
        if let Some(existing) = self.categories.iter().find(|c| c.has_name(&input.name)) {
            return Err(StoreError::DuplicateCategory(existing.name.clone()));
        }

        let category = Category::new(user_id, &input);
        let stored = match self.gateway.insert_category(&category).await {
            Ok(stored) => stored,
            Err(CoreError::Conflict(_)) => {
                return Err(StoreError::DuplicateCategory(category.name));
            }
            Err(e) => return Err(e.into()),
        };

        self.merge_category(stored.clone());
        tracing::info!(category_id = %stored.id, name = %stored.name, "Category created");
        Ok(stored)
    }

    async fn try_delete_category(
        &mut self,
        id: EntityId,
        reassign_to: Option<EntityId>,
    ) -> Result<u64, StoreError> {
        let user_id = self.user_id()?;
        self.require_category(id)?;
        if self.categories.len() <= 1 {
            return Err(StoreError::LastCategory);
        }
        if let Some(target) = reassign_to {
            if target == id {
                return Err(StoreError::Invalid(
                    "Notes cannot be moved into the category being deleted".to_string(),
                ));
            }
            self.require_category(target)?;
        }

        // Moved notes must come out newer than anything cached for them.
        let stamp = self
            .notes
            .iter()
            .filter(|n| n.category_id == Some(id))
            .map(|n| n.updated_at)
            .max()
            .map_or_else(now, next_stamp);

        match self
            .gateway
            .delete_category(user_id, id, reassign_to, stamp)
            .await
        {
            Ok(moved) => {
                self.drop_category(id, reassign_to, Some(stamp));
                tracing::info!(category_id = %id, moved, "Category deleted");
                Ok(moved)
            }
            Err(e) => {
                if matches!(e, CoreError::NotFound { .. }) {
                    // Our view of the categories is out of date.
                    self.resync_quietly().await;
                }
                Err(e.into())
            }
        }
    }

    // -----------------------------------------------------------------------
    // Realtime
    // -----------------------------------------------------------------------

    /// Reconcile a change made elsewhere (or the echo of our own write).
    /// Events for other users, deleted rows, or older than the cached row
    /// are ignored.
    pub fn apply_change(&mut self, event: ChangeEvent) {
        let Some(user_id) = self.session.as_ref().map(|s| s.user_id) else {
            return;
        };
        if event.owner() != user_id {
            tracing::warn!(
                table = event.table(),
                row_id = %event.row_id(),
                "Ignoring change for another user"
            );
            return;
        }

        match event {
            ChangeEvent::Note(RowChange::Inserted(note) | RowChange::Updated(note)) => {
                self.merge_note(note);
            }
            ChangeEvent::Note(RowChange::Deleted { id, .. }) => {
                self.forget_note(id);
            }
            ChangeEvent::Category(RowChange::Inserted(category) | RowChange::Updated(category)) => {
                self.merge_category(category);
            }
            ChangeEvent::Category(RowChange::Deleted { id, .. }) => {
                self.drop_category(id, None, None);
            }
        }
    }

    /// Apply one item from a change stream; a resync request re-fetches.
    pub async fn apply_feed_item(&mut self, item: FeedItem) -> Result<(), StoreError> {
        match item {
            FeedItem::Change(event) => {
                self.apply_change(event);
                Ok(())
            }
            FeedItem::Resync => {
                tracing::info!("Resync requested by change feed");
                let result = self.try_refresh().await;
                self.report("Error syncing notes", result)
            }
        }
    }

    // -----------------------------------------------------------------------
    // Cache primitives
    // -----------------------------------------------------------------------

    /// Insert or replace `note` unless the cached copy is newer or the note
    /// was deleted. Returns whether the cache changed.
    fn merge_note(&mut self, note: Note) -> bool {
        if self.tombstones.contains(&note.id) {
            tracing::trace!(note_id = %note.id, "Ignoring change to deleted note");
            return false;
        }
        match self.note_mut(note.id) {
            Some(cached) if note.updated_at < cached.updated_at => {
                tracing::debug!(
                    note_id = %note.id,
                    incoming = %note.updated_at,
                    cached = %cached.updated_at,
                    "Ignoring stale note"
                );
                false
            }
            Some(cached) => {
                *cached = note;
                true
            }
            None => {
                self.notes.insert(0, note);
                true
            }
        }
    }

    /// Remove a note (idempotently), remember it as deleted, and clear the
    /// selection if it was selected.
    fn forget_note(&mut self, id: EntityId) -> Option<Note> {
        self.tombstones.insert(id);
        if self.active_note == Some(id) {
            self.active_note = None;
        }
        let index = self.notes.iter().position(|n| n.id == id)?;
        Some(self.notes.remove(index))
    }

    fn merge_category(&mut self, category: Category) {
        if self.tombstones.contains(&category.id) {
            return;
        }
        match self.categories.iter_mut().find(|c| c.id == category.id) {
            Some(cached) => *cached = category,
            None => self.categories.push(category),
        }
    }

    /// Remove a category in one step: its notes move to `reassign_to`
    /// (stamped with `stamp` when given) and a filter on it resets to all.
    fn drop_category(
        &mut self,
        id: EntityId,
        reassign_to: Option<EntityId>,
        stamp: Option<Timestamp>,
    ) {
        for note in self.notes.iter_mut().filter(|n| n.category_id == Some(id)) {
            note.category_id = reassign_to;
            if let Some(stamp) = stamp {
                note.updated_at = note.updated_at.max(stamp);
            }
        }
        self.categories.retain(|c| c.id != id);
        self.tombstones.insert(id);
        if self.filter.category == Some(id) {
            self.filter.category = None;
        }
    }

    fn note_mut(&mut self, id: EntityId) -> Option<&mut Note> {
        self.notes.iter_mut().find(|n| n.id == id)
    }

    fn require_category(&self, id: EntityId) -> Result<EntityId, StoreError> {
        self.category(id)
            .map(|c| c.id)
            .ok_or(StoreError::CategoryNotFound(id))
    }

    fn user_id(&self) -> Result<UserId, StoreError> {
        self.session
            .as_ref()
            .map(|s| s.user_id)
            .ok_or(StoreError::Unauthenticated)
    }

    fn report<T>(&self, context: &str, result: Result<T, StoreError>) -> Result<T, StoreError> {
        if let Err(e) = &result {
            self.notifier.error(context, e);
        }
        result
    }
}
