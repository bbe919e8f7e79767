//! [`Gateway`] implementation backed by PostgreSQL.

use async_trait::async_trait;
use jotpad_core::category::Category;
use jotpad_core::error::CoreError;
use jotpad_core::gateway::{Gateway, GatewayResult};
use jotpad_core::note::{Note, NotePatch, SharedNote};
use jotpad_core::types::{EntityId, Timestamp, UserId};

use crate::error::classify;
use crate::repositories::{CategoryRepo, NoteRepo};
use crate::DbPool;

/// Row store on a PostgreSQL pool. Cheap to clone.
#[derive(Clone)]
pub struct PgGateway {
    pool: DbPool,
}

impl PgGateway {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

#[async_trait]
impl Gateway for PgGateway {
    async fn list_categories(&self, user_id: UserId) -> GatewayResult<Vec<Category>> {
        let rows = CategoryRepo::list_by_user(&self.pool, user_id)
            .await
            .map_err(classify)?;
        Ok(rows.into_iter().map(Category::from).collect())
    }

    async fn find_category_by_name(
        &self,
        user_id: UserId,
        name: &str,
    ) -> GatewayResult<Option<Category>> {
        let row = CategoryRepo::find_by_name(&self.pool, user_id, name)
            .await
            .map_err(classify)?;
        Ok(row.map(Category::from))
    }

    async fn insert_category(&self, category: &Category) -> GatewayResult<Category> {
        let row = CategoryRepo::create(&self.pool, category)
            .await
            .map_err(classify)?;
        tracing::debug!(category_id = %row.id, user_id = %row.user_id, "Category inserted");
        Ok(row.into())
    }

    async fn delete_category(
        &self,
        user_id: UserId,
        id: EntityId,
        reassign_to: Option<EntityId>,
        stamp: Timestamp,
    ) -> GatewayResult<u64> {
        let mut tx = self.pool.begin().await.map_err(classify)?;

        CategoryRepo::lock(&mut tx, user_id, id)
            .await
            .map_err(classify)?
            .ok_or(CoreError::NotFound {
                entity: "Category",
                id,
            })?;

        if let Some(target) = reassign_to {
            CategoryRepo::find_by_id(&mut tx, user_id, target)
                .await
                .map_err(classify)?
                .ok_or(CoreError::NotFound {
                    entity: "Category",
                    id: target,
                })?;
        }

        let moved = NoteRepo::reassign_category(&mut tx, user_id, id, reassign_to, stamp)
            .await
            .map_err(classify)?;
        CategoryRepo::delete(&mut tx, user_id, id)
            .await
            .map_err(classify)?;

        // Dropping `tx` on any early return above rolls everything back.
        tx.commit().await.map_err(classify)?;

        tracing::info!(category_id = %id, user_id = %user_id, moved, "Category deleted");
        Ok(moved)
    }

    async fn list_notes(&self, user_id: UserId) -> GatewayResult<Vec<Note>> {
        let rows = NoteRepo::list_by_user(&self.pool, user_id)
            .await
            .map_err(classify)?;
        Ok(rows.into_iter().map(Note::from).collect())
    }

    async fn insert_note(&self, note: &Note) -> GatewayResult<Note> {
        let row = NoteRepo::create(&self.pool, note).await.map_err(classify)?;
        Ok(row.into())
    }

    async fn update_note(
        &self,
        user_id: UserId,
        id: EntityId,
        patch: &NotePatch,
        stamp: Timestamp,
    ) -> GatewayResult<Note> {
        NoteRepo::update(&self.pool, user_id, id, patch, stamp)
            .await
            .map_err(classify)?
            .map(Note::from)
            .ok_or(CoreError::NotFound { entity: "Note", id })
    }

    async fn delete_note(&self, user_id: UserId, id: EntityId) -> GatewayResult<bool> {
        NoteRepo::delete(&self.pool, user_id, id)
            .await
            .map_err(classify)
    }

    async fn find_shared_note(&self, id: EntityId) -> GatewayResult<Option<SharedNote>> {
        let row = NoteRepo::find_public(&self.pool, id)
            .await
            .map_err(classify)?;
        Ok(row.map(SharedNote::from))
    }
}
