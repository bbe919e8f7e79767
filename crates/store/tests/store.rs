mod common;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use assert_matches::assert_matches;
use async_trait::async_trait;
use chrono::Duration;
use common::{harness, harness_with, loaded, session};
use jotpad_core::category::{Category, NewCategory};
use jotpad_core::change::{ChangeEvent, RowChange};
use jotpad_core::error::CoreError;
use jotpad_core::gateway::{Gateway, GatewayResult};
use jotpad_core::note::{Note, NotePatch, SharedNote};
use jotpad_core::types::{next_stamp, EntityId, Timestamp, UserId};
use jotpad_events::FeedItem;
use jotpad_store::{
    ErrorKind, GatewayOp, MemoryGateway, NotificationLevel, Notifier, NoteStore, StoreConfig,
    StoreError, WriteMode,
};

const BOTH_MODES: [WriteMode; 2] = [WriteMode::Optimistic, WriteMode::Confirmed];

fn category_id(h: &common::Harness, name: &str) -> EntityId {
    h.store
        .categories()
        .iter()
        .find(|c| c.name == name)
        .map(|c| c.id)
        .unwrap()
}

fn offline() -> CoreError {
    CoreError::Unavailable("connection refused".into())
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

#[tokio::test]
async fn load_seeds_default_categories_once() {
    let mut h = harness(WriteMode::Optimistic);

    h.store.load(Some(h.session.clone())).await.unwrap();
    let names: Vec<&str> = h.store.categories().iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, ["Ideas", "Personal", "Tasks", "Work"]);
    assert_eq!(h.gateway.calls(GatewayOp::InsertCategory), 4);

    h.store.load(Some(h.session.clone())).await.unwrap();
    assert_eq!(h.store.categories().len(), 4);
    assert_eq!(h.gateway.calls(GatewayOp::InsertCategory), 4);
    assert!(h.drain_notifications().is_empty());
}

/// Another device seeds "Work" between our empty listing and our insert.
struct RacingGateway {
    inner: MemoryGateway,
    raced: AtomicBool,
}

#[async_trait]
impl Gateway for RacingGateway {
    async fn list_categories(&self, user_id: UserId) -> GatewayResult<Vec<Category>> {
        if !self.raced.swap(true, Ordering::SeqCst) {
            let work = Category::new(user_id, &NewCategory::new("Work", Some("#60a5fa")));
            self.inner.insert_category(&work).await?;
            return Ok(Vec::new());
        }
        self.inner.list_categories(user_id).await
    }

    async fn find_category_by_name(
        &self,
        user_id: UserId,
        name: &str,
    ) -> GatewayResult<Option<Category>> {
        self.inner.find_category_by_name(user_id, name).await
    }

    async fn insert_category(&self, category: &Category) -> GatewayResult<Category> {
        self.inner.insert_category(category).await
    }

    async fn delete_category(
        &self,
        user_id: UserId,
        id: EntityId,
        reassign_to: Option<EntityId>,
        stamp: Timestamp,
    ) -> GatewayResult<u64> {
        self.inner.delete_category(user_id, id, reassign_to, stamp).await
    }

    async fn list_notes(&self, user_id: UserId) -> GatewayResult<Vec<Note>> {
        self.inner.list_notes(user_id).await
    }

    async fn insert_note(&self, note: &Note) -> GatewayResult<Note> {
        self.inner.insert_note(note).await
    }

    async fn update_note(
        &self,
        user_id: UserId,
        id: EntityId,
        patch: &NotePatch,
        stamp: Timestamp,
    ) -> GatewayResult<Note> {
        self.inner.update_note(user_id, id, patch, stamp).await
    }

    async fn delete_note(&self, user_id: UserId, id: EntityId) -> GatewayResult<bool> {
        self.inner.delete_note(user_id, id).await
    }

    async fn find_shared_note(&self, id: EntityId) -> GatewayResult<Option<SharedNote>> {
        self.inner.find_shared_note(id).await
    }
}

#[tokio::test]
async fn default_seeding_tolerates_concurrent_creation() {
    let gateway = Arc::new(RacingGateway {
        inner: MemoryGateway::new(),
        raced: AtomicBool::new(false),
    });
    let notifier = Notifier::default();
    let mut notifications = notifier.subscribe();
    let mut store = NoteStore::new(gateway, &StoreConfig::default(), notifier);

    store.load(Some(session())).await.unwrap();

    assert_eq!(store.categories().len(), 4);
    assert_eq!(
        store.categories().iter().filter(|c| c.name == "Work").count(),
        1
    );
    assert!(notifications.try_recv().is_err());
}

#[tokio::test]
async fn failed_load_keeps_last_good_cache() {
    let mut h = loaded(WriteMode::Optimistic).await;
    let note = h.store.create_note(None).await.unwrap();

    h.gateway.fail_next(GatewayOp::ListNotes, offline());
    let err = h.store.load(Some(h.session.clone())).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Remote);
    assert!(h.store.note(note.id).is_some());
    assert_eq!(h.store.categories().len(), 4);

    let notifications = h.drain_notifications();
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0].level, NotificationLevel::Error);
    assert!(notifications[0].message.starts_with("Error loading data"));
}

#[tokio::test]
async fn missing_schema_is_distinct_and_not_retried() {
    let mut h = harness(WriteMode::Optimistic);
    h.gateway.fail_next(
        GatewayOp::ListCategories,
        CoreError::SchemaMissing("relation \"categories\" does not exist".into()),
    );

    let err = h.store.load(Some(h.session.clone())).await.unwrap_err();

    assert_matches!(err, StoreError::SchemaMissing(_));
    assert_eq!(h.gateway.calls(GatewayOp::ListCategories), 1);
    let notifications = h.drain_notifications();
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0].kind, Some(ErrorKind::SchemaMissing));
}

#[tokio::test]
async fn sign_out_clears_everything() {
    let mut h = loaded(WriteMode::Optimistic).await;
    h.store.create_note(None).await.unwrap();
    h.store.set_search("plan");

    h.store.load(None).await.unwrap();

    assert!(h.store.session().is_none());
    assert!(h.store.notes().is_empty());
    assert!(h.store.categories().is_empty());
    assert!(h.store.active_note().is_none());
    assert_eq!(h.store.filter().search, "");
}

#[tokio::test]
async fn signed_out_operations_rejected_before_any_remote_call() {
    let mut h = harness(WriteMode::Optimistic);

    let err = h.store.create_note(None).await.unwrap_err();
    assert_matches!(err, StoreError::Unauthenticated);
    let err = h.store.create_category("Work", None).await.unwrap_err();
    assert_matches!(err, StoreError::Unauthenticated);

    assert_eq!(h.gateway.calls(GatewayOp::InsertNote), 0);
    assert_eq!(h.gateway.calls(GatewayOp::InsertCategory), 0);
    let notifications = h.drain_notifications();
    assert_eq!(notifications.len(), 2);
    assert!(notifications
        .iter()
        .all(|n| n.kind == Some(ErrorKind::Authentication)));
}

// ---------------------------------------------------------------------------
// Notes
// ---------------------------------------------------------------------------

#[tokio::test]
async fn create_then_delete_clears_selection() {
    for mode in BOTH_MODES {
        let mut h = loaded(mode).await;

        let note = h.store.create_note(None).await.unwrap();
        assert_eq!(note.title, "Untitled Note");
        assert_eq!(note.content, "");
        assert_eq!(note.category_id, Some(h.store.categories()[0].id));
        assert_eq!(h.store.active_note().map(|n| n.id), Some(note.id));

        h.store.delete_note(note.id).await.unwrap();

        assert!(h.store.note(note.id).is_none());
        assert!(h.store.active_note().is_none());
        let remote = h.gateway.list_notes(h.session.user_id).await.unwrap();
        assert!(remote.is_empty(), "{mode:?}");
        assert!(h.drain_notifications().is_empty());
    }
}

#[tokio::test]
async fn create_note_in_unknown_category_rejected() {
    let mut h = loaded(WriteMode::Optimistic).await;
    let err = h.store.create_note(Some(uuid::Uuid::new_v4())).await.unwrap_err();
    assert_matches!(err, StoreError::CategoryNotFound(_));
    assert_eq!(h.gateway.calls(GatewayOp::InsertNote), 0);
}

#[tokio::test]
async fn create_note_without_categories_rejected() {
    let mut h = loaded(WriteMode::Optimistic).await;
    let user_id = h.session.user_id;
    let ids: Vec<EntityId> = h.store.categories().iter().map(|c| c.id).collect();
    for id in ids {
        h.store
            .apply_change(ChangeEvent::Category(RowChange::Deleted { id, user_id }));
    }

    let err = h.store.create_note(None).await.unwrap_err();

    assert_matches!(err, StoreError::NoCategoryAvailable);
    assert_eq!(h.gateway.calls(GatewayOp::InsertNote), 0);
    let notifications = h.drain_notifications();
    assert_eq!(notifications.len(), 1);
    assert_eq!(
        notifications[0].message,
        "No category available. Please create a category first."
    );
}

#[tokio::test]
async fn update_stamps_strictly_later_and_merges_fields() {
    for mode in BOTH_MODES {
        let mut h = loaded(mode).await;
        let work = category_id(&h, "Work");
        let note = h.store.create_note(None).await.unwrap();

        let patch = NotePatch::default()
            .with_title("Plan")
            .with_content("Ship it")
            .with_category(Some(work))
            .with_pinned(true);
        let updated = h.store.update_note(note.id, patch).await.unwrap();

        assert!(updated.updated_at > note.updated_at);
        assert_eq!(updated.title, "Plan");
        assert_eq!(updated.content, "Ship it");
        assert_eq!(updated.category_id, Some(work));
        assert!(updated.is_pinned);
        assert!(!updated.is_public);
        assert_eq!(updated.created_at, note.created_at);
        assert_eq!(h.store.active_note(), Some(&updated));

        let remote = h.gateway.list_notes(h.session.user_id).await.unwrap();
        assert_eq!(remote, vec![updated], "{mode:?}");
    }
}

#[tokio::test]
async fn overlong_title_rejected_before_remote_call() {
    let mut h = loaded(WriteMode::Optimistic).await;
    let note = h.store.create_note(None).await.unwrap();

    let err = h
        .store
        .update_note(note.id, NotePatch::default().with_title("x".repeat(201)))
        .await
        .unwrap_err();

    assert_matches!(err, StoreError::Invalid(_));
    assert_eq!(h.gateway.calls(GatewayOp::UpdateNote), 0);
    assert_eq!(h.store.note(note.id), Some(&note));
}

#[tokio::test]
async fn optimistic_update_failure_restores_and_refetches() {
    let mut h = loaded(WriteMode::Optimistic).await;
    let note = h.store.create_note(None).await.unwrap();
    let listings = h.gateway.calls(GatewayOp::ListNotes);

    h.gateway.fail_next(GatewayOp::UpdateNote, offline());
    let err = h
        .store
        .update_note(note.id, NotePatch::default().with_title("Lost"))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Remote);
    assert_eq!(h.store.note(note.id).map(|n| n.title.as_str()), Some("Untitled Note"));
    assert_eq!(h.gateway.calls(GatewayOp::ListNotes), listings + 1);
    assert_eq!(h.drain_notifications().len(), 1);
}

#[tokio::test]
async fn optimistic_create_failure_removes_placeholder() {
    let mut h = loaded(WriteMode::Optimistic).await;
    h.gateway.fail_next(GatewayOp::InsertNote, offline());

    let err = h.store.create_note(None).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Remote);
    assert!(h.store.notes().is_empty());
    assert!(h.store.active_note().is_none());
    let notifications = h.drain_notifications();
    assert_eq!(notifications.len(), 1);
    assert!(notifications[0].message.starts_with("Error creating note"));
}

#[tokio::test]
async fn confirmed_create_failure_touches_nothing() {
    let mut h = loaded(WriteMode::Confirmed).await;
    let listings = h.gateway.calls(GatewayOp::ListNotes);
    h.gateway.fail_next(GatewayOp::InsertNote, offline());

    h.store.create_note(None).await.unwrap_err();

    assert!(h.store.notes().is_empty());
    assert_eq!(h.gateway.calls(GatewayOp::ListNotes), listings);
    assert_eq!(h.drain_notifications().len(), 1);
}

#[tokio::test]
async fn optimistic_delete_failure_restores_note() {
    let mut h = loaded(WriteMode::Optimistic).await;
    let note = h.store.create_note(None).await.unwrap();

    assert_eq!(h.store.active_note().map(|n| n.id), Some(note.id));

    h.gateway.fail_next(GatewayOp::DeleteNote, offline());
    h.store.delete_note(note.id).await.unwrap_err();

    assert_eq!(h.store.note(note.id), Some(&note));
    assert_eq!(h.store.active_note().map(|n| n.id), Some(note.id));
    assert_eq!(h.drain_notifications().len(), 1);
}

#[tokio::test]
async fn confirmed_pin_toggle_failure_refetches() {
    let mut h = loaded(WriteMode::Confirmed).await;
    let note = h.store.create_note(None).await.unwrap();
    let listings = h.gateway.calls(GatewayOp::ListNotes);

    h.gateway.fail_next(GatewayOp::UpdateNote, offline());
    h.store.toggle_pinned(note.id).await.unwrap_err();

    assert_eq!(h.gateway.calls(GatewayOp::ListNotes), listings + 1);
    assert!(!h.store.note(note.id).unwrap().is_pinned);
    assert_eq!(h.drain_notifications().len(), 1);
}

#[tokio::test]
async fn delete_racing_realtime_delete_is_idempotent() {
    let mut h = loaded(WriteMode::Optimistic).await;
    let user_id = h.session.user_id;
    let note = h.store.create_note(None).await.unwrap();

    // Deleted on another device first.
    h.gateway.delete_note(user_id, note.id).await.unwrap();
    h.store
        .apply_change(ChangeEvent::Note(RowChange::Deleted { id: note.id, user_id }));
    h.store.delete_note(note.id).await.unwrap();

    // A late echo of an earlier write does not resurrect it.
    h.store
        .apply_change(ChangeEvent::Note(RowChange::Updated(note.clone())));

    assert!(h.store.note(note.id).is_none());
    assert!(h.drain_notifications().is_empty());
}

#[tokio::test]
async fn toggle_pinned_moves_note_to_top() {
    let mut h = loaded(WriteMode::Optimistic).await;
    let older = h.store.create_note(None).await.unwrap();
    let newer = h.store.create_note(None).await.unwrap();
    assert_eq!(h.store.visible_notes()[0].id, newer.id);

    let pinned = h.store.toggle_pinned(older.id).await.unwrap();
    assert!(pinned.is_pinned);
    assert_eq!(h.store.visible_notes()[0].id, older.id);

    let unpinned = h.store.toggle_pinned(older.id).await.unwrap();
    assert!(!unpinned.is_pinned);
    assert!(unpinned.updated_at > pinned.updated_at);
}

#[tokio::test]
async fn set_public_notifies_and_exposes_share_link() {
    let mut h = loaded(WriteMode::Optimistic).await;
    let note = h.store.create_note(None).await.unwrap();
    assert!(h.store.share_url(note.id).is_none());

    h.store.set_public(note.id, true).await.unwrap();

    assert_eq!(
        h.store.share_url(note.id),
        Some(format!("http://localhost:5173/shared/{}", note.id))
    );
    assert!(h.gateway.find_shared_note(note.id).await.unwrap().is_some());
    let notifications = h.drain_notifications();
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0].level, NotificationLevel::Success);
    assert_eq!(notifications[0].message, "Note is now public and can be shared");

    h.store.set_public(note.id, false).await.unwrap();
    assert!(h.store.share_url(note.id).is_none());
    assert!(h.gateway.find_shared_note(note.id).await.unwrap().is_none());
    assert_eq!(h.drain_notifications()[0].message, "Note is now private");
}

// ---------------------------------------------------------------------------
// View
// ---------------------------------------------------------------------------

#[tokio::test]
async fn search_and_pinned_ordering() {
    let mut h = loaded(WriteMode::Optimistic).await;
    let groceries = h.store.create_note(None).await.unwrap();
    h.store
        .update_note(
            groceries.id,
            NotePatch::default().with_title("Groceries").with_pinned(true),
        )
        .await
        .unwrap();
    let meeting = h.store.create_note(None).await.unwrap();
    h.store
        .update_note(meeting.id, NotePatch::default().with_title("Meeting notes"))
        .await
        .unwrap();

    h.store.set_search("meet");
    let titles: Vec<&str> = h.store.visible_notes().iter().map(|n| n.title.as_str()).collect();
    assert_eq!(titles, ["Meeting notes"]);

    h.store.set_search("");
    let titles: Vec<&str> = h.store.visible_notes().iter().map(|n| n.title.as_str()).collect();
    assert_eq!(titles, ["Groceries", "Meeting notes"]);
}

#[tokio::test]
async fn category_filter_narrows_visible_notes() {
    let mut h = loaded(WriteMode::Optimistic).await;
    let work = category_id(&h, "Work");
    let ideas = category_id(&h, "Ideas");
    let in_work = h.store.create_note(Some(work)).await.unwrap();
    h.store.create_note(Some(ideas)).await.unwrap();

    h.store.set_category_filter(Some(work));
    let visible: Vec<EntityId> = h.store.visible_notes().iter().map(|n| n.id).collect();
    assert_eq!(visible, vec![in_work.id]);
}

// ---------------------------------------------------------------------------
// Categories
// ---------------------------------------------------------------------------

#[tokio::test]
async fn duplicate_category_rejected_without_remote_call() {
    let mut h = loaded(WriteMode::Optimistic).await;

    let err = h.store.create_category("  work ", None).await.unwrap_err();

    assert_matches!(err, StoreError::DuplicateCategory(ref name) if name == "Work");
    assert_eq!(h.gateway.calls(GatewayOp::InsertCategory), 4);
    assert_eq!(
        h.drain_notifications()[0].message,
        "A category named 'Work' already exists"
    );
}

#[tokio::test]
async fn blank_category_name_rejected() {
    let mut h = loaded(WriteMode::Optimistic).await;
    let err = h.store.create_category("   ", None).await.unwrap_err();
    assert_eq!(err, StoreError::Invalid("Category name is required".to_string()));
}

#[tokio::test]
async fn created_category_is_appended() {
    let mut h = loaded(WriteMode::Optimistic).await;
    let created = h.store.create_category(" Archive ", Some("#a78bfa")).await.unwrap();

    assert_eq!(created.name, "Archive");
    assert_eq!(created.color, "#a78bfa");
    assert_eq!(h.store.categories().last(), Some(&created));
}

#[tokio::test]
async fn delete_category_moves_notes_atomically() {
    for mode in BOTH_MODES {
        let mut h = loaded(mode).await;
        let user_id = h.session.user_id;
        let doomed = h.store.create_category("Projects", None).await.unwrap();
        let target = h.store.create_category("Archive", None).await.unwrap();
        let a = h.store.create_note(Some(doomed.id)).await.unwrap();
        let b = h.store.create_note(Some(doomed.id)).await.unwrap();

        let moved = h
            .store
            .delete_category(doomed.id, Some(target.id))
            .await
            .unwrap();

        assert_eq!(moved, 2);
        assert!(h.store.category(doomed.id).is_none());
        for before in [&a, &b] {
            let after = h.store.note(before.id).unwrap();
            assert_eq!(after.category_id, Some(target.id));
            assert!(after.updated_at > before.updated_at);
        }

        let remote_notes = h.gateway.list_notes(user_id).await.unwrap();
        assert!(remote_notes.iter().all(|n| n.category_id == Some(target.id)));
        let remote_categories = h.gateway.list_categories(user_id).await.unwrap();
        assert!(remote_categories.iter().all(|c| c.id != doomed.id), "{mode:?}");
    }
}

#[tokio::test]
async fn delete_category_without_target_uncategorizes() {
    let mut h = loaded(WriteMode::Optimistic).await;
    let doomed = category_id(&h, "Tasks");
    let note = h.store.create_note(Some(doomed)).await.unwrap();

    h.store.delete_category(doomed, None).await.unwrap();

    assert_eq!(h.store.note(note.id).unwrap().category_id, None);
}

#[tokio::test]
async fn last_category_cannot_be_deleted() {
    let mut h = loaded(WriteMode::Optimistic).await;
    let ids: Vec<EntityId> = h.store.categories().iter().map(|c| c.id).collect();

    for id in &ids[..3] {
        h.store.delete_category(*id, None).await.unwrap();
    }
    let err = h.store.delete_category(ids[3], None).await.unwrap_err();

    assert_matches!(err, StoreError::LastCategory);
    assert_eq!(h.gateway.calls(GatewayOp::DeleteCategory), 3);
    assert_eq!(h.store.categories().len(), 1);
    let notifications = h.drain_notifications();
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0].message, "You must keep at least one category");
}

#[tokio::test]
async fn failed_category_delete_keeps_category_and_references() {
    let mut h = loaded(WriteMode::Optimistic).await;
    let doomed = category_id(&h, "Work");
    let target = category_id(&h, "Ideas");
    let note = h.store.create_note(Some(doomed)).await.unwrap();

    h.gateway.fail_next(GatewayOp::DeleteCategory, offline());
    h.store.delete_category(doomed, Some(target)).await.unwrap_err();

    assert!(h.store.category(doomed).is_some());
    assert_eq!(h.store.note(note.id).unwrap().category_id, Some(doomed));
    let remote = h.gateway.list_notes(h.session.user_id).await.unwrap();
    assert_eq!(remote[0].category_id, Some(doomed));
    assert_eq!(h.drain_notifications().len(), 1);
}

#[tokio::test]
async fn reassign_to_unknown_category_rejected() {
    let mut h = loaded(WriteMode::Optimistic).await;
    let doomed = category_id(&h, "Work");

    let err = h
        .store
        .delete_category(doomed, Some(uuid::Uuid::new_v4()))
        .await
        .unwrap_err();

    assert_matches!(err, StoreError::CategoryNotFound(_));
    assert_eq!(h.gateway.calls(GatewayOp::DeleteCategory), 0);
}

#[tokio::test]
async fn deleting_filtered_category_resets_filter() {
    let mut h = loaded(WriteMode::Optimistic).await;
    let user_id = h.session.user_id;

    let local = category_id(&h, "Work");
    h.store.set_category_filter(Some(local));
    h.store.delete_category(local, None).await.unwrap();
    assert_eq!(h.store.filter().category, None);

    let remote = category_id(&h, "Ideas");
    let note = h.store.create_note(Some(remote)).await.unwrap();
    h.store.set_category_filter(Some(remote));
    h.store
        .apply_change(ChangeEvent::Category(RowChange::Deleted { id: remote, user_id }));
    assert_eq!(h.store.filter().category, None);
    assert_eq!(h.store.note(note.id).unwrap().category_id, None);
}

// ---------------------------------------------------------------------------
// Realtime
// ---------------------------------------------------------------------------

#[tokio::test]
async fn local_update_beats_stale_event_arriving_later() {
    for mode in BOTH_MODES {
        let mut h = loaded(mode).await;
        let note = h.store.create_note(None).await.unwrap();

        let local = h
            .store
            .update_note(note.id, NotePatch::default().with_title("Local"))
            .await
            .unwrap();

        let mut stale = local.clone();
        stale.title = "Remote".to_string();
        stale.updated_at = local.updated_at - Duration::microseconds(1);
        h.store
            .apply_change(ChangeEvent::Note(RowChange::Updated(stale)));

        assert_eq!(h.store.note(note.id).unwrap().title, "Local", "{mode:?}");
    }
}

#[tokio::test]
async fn local_update_beats_stale_event_arriving_first() {
    for mode in BOTH_MODES {
        let mut h = loaded(mode).await;
        let note = h.store.create_note(None).await.unwrap();

        let mut remote = note.clone();
        remote.title = "Remote".to_string();
        remote.updated_at = next_stamp(note.updated_at);
        h.store
            .apply_change(ChangeEvent::Note(RowChange::Updated(remote.clone())));
        assert_eq!(h.store.note(note.id).unwrap().title, "Remote");

        let local = h
            .store
            .update_note(note.id, NotePatch::default().with_title("Local"))
            .await
            .unwrap();
        assert!(local.updated_at > remote.updated_at);

        // The same stale event delivered again changes nothing.
        h.store
            .apply_change(ChangeEvent::Note(RowChange::Updated(remote)));
        assert_eq!(h.store.note(note.id).unwrap().title, "Local", "{mode:?}");
        let stored = h.gateway.list_notes(h.session.user_id).await.unwrap();
        assert_eq!(stored[0].title, "Local");
    }
}

#[tokio::test]
async fn realtime_insert_from_another_device_appears() {
    let mut h = loaded(WriteMode::Optimistic).await;
    let elsewhere = Note::new(h.session.user_id, Some(category_id(&h, "Ideas")));

    h.store
        .apply_change(ChangeEvent::Note(RowChange::Inserted(elsewhere.clone())));

    assert_eq!(h.store.note(elsewhere.id), Some(&elsewhere));
    assert_eq!(h.store.visible_notes()[0].id, elsewhere.id);
}

#[tokio::test]
async fn other_users_events_ignored() {
    let mut h = loaded(WriteMode::Optimistic).await;
    let foreign = Note::new(uuid::Uuid::new_v4(), None);

    h.store
        .apply_change(ChangeEvent::Note(RowChange::Inserted(foreign)));

    assert!(h.store.notes().is_empty());
}

#[tokio::test]
async fn resync_item_refetches_missed_rows() {
    let gateway = Arc::new(MemoryGateway::new());
    let mut h = harness_with(WriteMode::Optimistic, gateway.clone());
    h.store.load(Some(h.session.clone())).await.unwrap();

    let missed = Note::new(h.session.user_id, None);
    gateway.put_note(missed.clone());
    assert!(h.store.note(missed.id).is_none());

    h.store.apply_feed_item(FeedItem::Resync).await.unwrap();

    assert_eq!(h.store.note(missed.id), Some(&missed));
}
