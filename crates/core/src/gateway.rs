//! The persistence seam between the note store and a backend.
//!
//! Implementations: `PgGateway` (PostgreSQL, in `jotpad-db`),
//! `LocalFileGateway` and `MemoryGateway` (in `jotpad-store`). Every call
//! is scoped by the owning user; ownership enforcement beyond that filter
//! is the backend's job.

use async_trait::async_trait;

use crate::category::Category;
use crate::error::CoreError;
use crate::note::{Note, NotePatch, SharedNote};
use crate::types::{EntityId, Timestamp, UserId};

pub type GatewayResult<T> = Result<T, CoreError>;

#[async_trait]
pub trait Gateway: Send + Sync {
    /// All categories owned by `user_id`, ordered by name.
    async fn list_categories(&self, user_id: UserId) -> GatewayResult<Vec<Category>>;

    /// Case-insensitive lookup of a category by name.
    async fn find_category_by_name(
        &self,
        user_id: UserId,
        name: &str,
    ) -> GatewayResult<Option<Category>>;

    /// Insert a category. A duplicate name yields [`CoreError::Conflict`].
    async fn insert_category(&self, category: &Category) -> GatewayResult<Category>;

    /// Move every note in category `id` to `reassign_to` (stamping each with
    /// `stamp`), then delete the category, as one atomic unit. Returns the
    /// number of notes moved.
    async fn delete_category(
        &self,
        user_id: UserId,
        id: EntityId,
        reassign_to: Option<EntityId>,
        stamp: Timestamp,
    ) -> GatewayResult<u64>;

    /// All notes owned by `user_id`, most recently updated first.
    async fn list_notes(&self, user_id: UserId) -> GatewayResult<Vec<Note>>;

    async fn insert_note(&self, note: &Note) -> GatewayResult<Note>;

    /// Apply `patch` and set `updated_at = stamp`, returning the stored row.
    async fn update_note(
        &self,
        user_id: UserId,
        id: EntityId,
        patch: &NotePatch,
        stamp: Timestamp,
    ) -> GatewayResult<Note>;

    /// Delete a note. Returns `false` if it was already gone.
    async fn delete_note(&self, user_id: UserId, id: EntityId) -> GatewayResult<bool>;

    /// Unauthenticated read: the public fields of a published note.
    async fn find_shared_note(&self, id: EntityId) -> GatewayResult<Option<SharedNote>>;
}
